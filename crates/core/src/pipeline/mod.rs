pub mod grab_sheets_use_case;
pub mod pipeline_logger;
pub mod run_context;
