//! Permission system for checking user roles.
//!
//! - Cached standing lookups (reduces API hits)
//! - Bot owners bypass every check
//! - Private chats: the user administers their own chat
//!
//! ```rust,ignore
//! if state.permissions.is_admin(chat_id, user_id).await? {
//!     // ...
//! }
//! ```

mod checker;

pub use checker::Permissions;
