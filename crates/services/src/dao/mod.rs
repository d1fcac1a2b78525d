pub mod base;
pub mod member;
pub mod memory;

pub use base::{BaseDao, DaoError, DaoResult};
pub use member::{MemberBulkStore, MemberDao, MemberStore};
pub use memory::MemoryMemberStore;
