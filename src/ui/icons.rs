pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const PIN: &str = "📍";
    pub const CIRCLE: &str = "🔵";
    pub const SCROLL: &str = "📜";
    pub const PLUG: &str = "🔌";
}
