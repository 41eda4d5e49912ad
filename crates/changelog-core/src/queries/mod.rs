//! Change log retrieval: the repository seam, query criteria and the
//! related-object traversals built on top of them.

pub mod criteria;
pub mod memory_repo;
pub mod related;
pub mod repository;

pub use criteria::{LogCriteria, LogOrder};
pub use memory_repo::MemoryLogRepo;
pub use related::{
    many_to_many_related_change_log, one_to_many_related_change_log, related_change_log,
    ManyToManyChangeLog, OneToManyChangeLog, RelatedChangeLog,
};
pub use repository::ChangeLogRepository;
