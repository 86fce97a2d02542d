mod entity;
mod event;
mod representation;
mod research;

pub use entity::{EntityRepository, EntitySearchFilters};
pub use event::{EventRepository, TimelineFilters};
pub use representation::RepresentationRepository;
pub use research::ResearchRepository;
