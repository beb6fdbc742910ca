mod catalog;
mod generator;
mod writer;

pub use catalog::list_reports;
pub use generator::ReportGenerator;
pub use writer::ReportWriter;
