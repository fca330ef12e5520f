use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapter::AdapterParams;
use crate::geo::{BoundingBox, BoundingCircle, Location};
use crate::host::{render_outcome, SessionSnapshot};
use crate::landmark::LandmarkRecord;
use crate::server::AppState;
use crate::variables::VariableBag;
use crate::Error;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Library error mapped to an HTTP status
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::UnknownAdapter(_) => StatusCode::NOT_FOUND,
            Error::InvalidLocation(_) => StatusCode::BAD_REQUEST,
            Error::ScriptSyntax(_)
            | Error::ScriptRuntime(_)
            | Error::LimitExceeded(_)
            | Error::MalformedResult { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct AdapterInfo {
    pub name: String,
    pub language: String,
    pub grammar: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// Adapter name, the session's current adapter when absent
    pub adapter: Option<String>,
    pub code: String,
    #[serde(default)]
    pub variables: VariableBag,
    pub bounding_box: BoundingBox,
    /// Derived from the box when absent
    pub bounding_circle: Option<BoundingCircle>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub landmarks: Vec<LandmarkRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CircleParams {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

#[derive(Debug, Deserialize)]
pub struct CodeBody {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct AdapterBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionBody {
    pub top_left: Location,
    pub bottom_right: Location,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub generation: u64,
    /// False when a newer run started before this one finished
    pub applied: bool,
    pub ok: bool,
    pub result: String,
}

pub async fn list_adapters(State(state): State<Arc<AppState>>) -> Json<Vec<AdapterInfo>> {
    Json(
        state
            .registry
            .adapters()
            .iter()
            .map(|a| AdapterInfo {
                name: a.name.clone(),
                language: a.language.clone(),
                grammar: a.grammar.clone(),
            })
            .collect(),
    )
}

pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    request.bounding_box.validate()?;

    let adapter = match request.adapter {
        Some(name) => state
            .registry
            .find_adapter(&name)
            .cloned()
            .ok_or(Error::UnknownAdapter(name))?,
        None => state.session.lock().await.current_adapter().clone(),
    };

    let mut params = AdapterParams::new(request.code, request.variables, request.bounding_box);
    if let Some(circle) = request.bounding_circle {
        params.bounding_circle = circle;
    }

    let landmarks = adapter.execute(&params).await?;
    Ok(Json(ExecuteResponse { landmarks }))
}

pub async fn circle(Query(params): Query<CircleParams>) -> Result<Json<BoundingCircle>, ApiError> {
    let bbox = BoundingBox::from_corners(
        Location::new(params.north, params.west),
        Location::new(params.south, params.east),
    );
    bbox.validate()?;
    Ok(Json(bbox.bounding_circle()))
}

pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

pub async fn set_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CodeBody>,
) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.set_code(body.code);
    Json(session.snapshot())
}

pub async fn set_adapter(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AdapterBody>,
) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.select_adapter(&body.name);
    Json(session.snapshot())
}

pub async fn set_variables(
    State(state): State<Arc<AppState>>,
    Json(variables): Json<VariableBag>,
) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.set_variables(variables);
    Json(session.snapshot())
}

pub async fn add_variable(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.variables_mut().add_placeholder();
    Json(session.snapshot())
}

pub async fn set_selection(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionBody>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let mut session = state.session.lock().await;
    session.select_rectangle(body.top_left, body.bottom_right)?;
    Ok(Json(session.snapshot()))
}

pub async fn run_session(State(state): State<Arc<AppState>>) -> Json<RunResponse> {
    let pending = state.session.lock().await.begin_run();
    let outcome = pending.execute().await;
    let applied = state.session.lock().await.finish(pending.generation, &outcome);

    Json(RunResponse {
        generation: pending.generation,
        applied,
        ok: outcome.is_ok(),
        result: render_outcome(&outcome),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TesterConfig;
    use serde_json::json;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(&TesterConfig::default()).unwrap())
    }

    fn request(value: serde_json::Value) -> ExecuteRequest {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_list_adapters() {
        let Json(adapters) = list_adapters(State(state())).await;
        assert_eq!(adapters[0].name, "rhai");
        assert_eq!(adapters[1].grammar, "json");
    }

    #[tokio::test]
    async fn test_execute_rhai() {
        let body = request(json!({
            "code": r#"[#{ lat: boundingCircle.center.lat, lng: boundingCircle.center.lng,
                          name: getVariableFromStorage("label"), description: "", types: [] }]"#,
            "variables": { "label": "center" },
            "boundingBox": { "topLeft": { "lat": 2.0, "lng": 0.0 }, "bottomRight": { "lat": 0.0, "lng": 2.0 } }
        }));

        let Json(response) = execute(State(state()), Json(body)).await.unwrap();
        assert_eq!(response.landmarks, vec![LandmarkRecord::new(1.0, 1.0, "center", "")]);
    }

    #[tokio::test]
    async fn test_execute_uses_given_circle() {
        let body = request(json!({
            "adapter": "rhai",
            "code": r#"[#{ lat: 0.0, lng: 0.0, name: `${boundingCircle.radius}`, description: "", types: [] }]"#,
            "boundingBox": { "topLeft": { "lat": 2.0, "lng": 0.0 }, "bottomRight": { "lat": 0.0, "lng": 2.0 } },
            "boundingCircle": { "center": { "lat": 1.0, "lng": 1.0 }, "radius": 5.0 }
        }));

        let Json(response) = execute(State(state()), Json(body)).await.unwrap();
        assert_eq!(response.landmarks[0].name, "5.0");
    }

    #[tokio::test]
    async fn test_execute_errors() {
        let bbox = json!({ "topLeft": { "lat": 1.0, "lng": 0.0 }, "bottomRight": { "lat": 0.0, "lng": 1.0 } });

        let err = execute(State(state()), Json(request(json!({ "adapter": "python", "code": "", "boundingBox": bbox }))))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = execute(State(state()), Json(request(json!({ "code": "let = ;", "boundingBox": bbox }))))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!err.0.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_circle() {
        let params = CircleParams { north: 51.505, west: -0.129, south: 51.495, east: -0.119 };
        let Json(result) = circle(Query(params)).await.unwrap();
        assert!((result.radius - 0.787).abs() < 0.01);

        let params = CircleParams { north: 91.0, west: 0.0, south: 0.0, east: 0.0 };
        assert_eq!(circle_status(params).await, StatusCode::BAD_REQUEST);
    }

    async fn circle_status(params: CircleParams) -> StatusCode {
        circle(Query(params)).await.unwrap_err().status()
    }

    #[tokio::test]
    async fn test_session_flow() {
        let state = state();

        let Json(snapshot) = set_adapter(State(state.clone()), Json(AdapterBody { name: "json".into() })).await;
        assert_eq!(snapshot.adapter, "json");
        let Json(snapshot) = set_adapter(State(state.clone()), Json(AdapterBody { name: "nope".into() })).await;
        assert_eq!(snapshot.adapter, "json");

        let Json(snapshot) = add_variable(State(state.clone())).await;
        assert_eq!(snapshot.variables.get("key1"), Some(&json!("")));

        let selection = SelectionBody {
            top_left: Location::new(51.505, -0.129),
            bottom_right: Location::new(51.495, -0.119),
        };
        let Json(snapshot) = set_selection(State(state.clone()), Json(selection)).await.unwrap();
        assert!((snapshot.bounding_circle.center.lng + 0.124).abs() < 1e-9);

        let code = r#"[{"lat": 51.5, "lng": -0.12, "name": "x", "description": "", "types": []}]"#;
        let Json(_) = set_code(State(state.clone()), Json(CodeBody { code: code.into() })).await;

        let Json(run) = run_session(State(state.clone())).await;
        assert!(run.ok);
        assert!(run.applied);
        assert_eq!(run.generation, 1);

        let Json(snapshot) = get_session(State(state)).await;
        assert_eq!(snapshot.result, run.result);
        assert!(snapshot.result.contains("\"name\": \"x\""));
    }

    #[tokio::test]
    async fn test_failed_session_run() {
        let state = state();
        let Json(_) = set_code(State(state.clone()), Json(CodeBody { code: "let x = ;".into() })).await;

        let Json(run) = run_session(State(state.clone())).await;
        assert!(!run.ok);
        assert!(run.result.starts_with("SyntaxError"));

        let Json(snapshot) = get_session(State(state)).await;
        assert_eq!(snapshot.code, "let x = ;");
    }
}
