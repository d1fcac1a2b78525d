pub mod dao;
pub mod member;
pub mod transfer;

pub use dao::{DaoError, DaoResult, MemberBulkStore, MemberDao, MemberStore, MemoryMemberStore};
pub use member::MemberService;
