pub mod refresh_token;
pub mod task;
pub mod user;

pub use refresh_token::RefreshTokenRecord;
pub use task::{Task, TaskInput, TaskQuery, TaskStatus, TaskUpdate};
pub use user::User;
