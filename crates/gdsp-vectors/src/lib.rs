//! Hardware test-vector export
//!
//! Quantized arrays are rendered to `$readmemh` hex, `$readmemb` binary and
//! Verilog lookup-table text, then committed through a `VectorSink`.

pub mod error;
pub mod exporter;
pub mod formats;
pub mod sink;

pub use error::{ExportError, ExportResult};
pub use exporter::{ExportBundle, IqExport, VectorExporter};
pub use sink::{DirSink, MemorySink, VectorSink};
