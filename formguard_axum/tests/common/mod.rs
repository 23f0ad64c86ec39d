pub mod test_app;

pub use mock_browser::{MockBrowser, body_text};
pub use test_app::{CountingUsers, FailingUsers, TestApp};
