pub mod document_writer;
pub mod page_compositor;
pub mod page_layout;
