pub const VALUE: &str = env!("CARGO_PKG_VERSION");
