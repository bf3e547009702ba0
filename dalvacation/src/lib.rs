pub mod config;
pub mod dir;
pub mod form;
pub mod services;
pub mod session;
pub mod signup;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Routes the application may be redirected to once a flow is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Landing page listing the rooms.
    Landing,
    SignIn,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::SignIn => "/signin",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}
