pub mod pdf_document_writer;
