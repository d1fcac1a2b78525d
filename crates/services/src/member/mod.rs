pub mod normalize;
pub mod params;
pub mod query;
pub mod service;
pub mod view;

pub use params::{FieldIssue, MemberListParams};
pub use query::{MemberFilter, MemberQuery};
pub use service::MemberService;
pub use view::{Member, MemberPage, Pagination};
