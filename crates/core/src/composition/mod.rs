pub mod compose_pages_use_case;
pub mod domain;
pub mod infrastructure;
