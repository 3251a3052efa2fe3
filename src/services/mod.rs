pub mod bucket;
pub mod sync;
pub mod track;
