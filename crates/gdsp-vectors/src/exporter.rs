use gdsp_core::fixed_point::{self, Quantized};
use gdsp_core::{ComplexSample, GdspError, QFormat, RealSample, Rounding, split_iq};

use crate::error::ExportResult;
use crate::formats;
use crate::sink::VectorSink;

/// File names written by `export_all`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub hex: String,
    pub mem: String,
    pub lut: String,
}

/// Quantized rails written by `export_iq`
#[derive(Debug, Clone)]
pub struct IqExport {
    pub i: Quantized,
    pub q: Quantized,
}

impl IqExport {
    pub fn saturated(&self) -> usize {
        self.i.saturated + self.q.saturated
    }
}

/// Renders quantized data and hands complete records to a sink
pub struct VectorExporter<S: VectorSink> {
    sink: S,
    written: Vec<String>,
}

impl<S: VectorSink> VectorExporter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, written: Vec::new() }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// File names committed so far, in write order
    pub fn written(&self) -> &[String] {
        &self.written
    }

    fn commit(&mut self, file_name: String, contents: &str, count: usize) -> ExportResult<String> {
        self.sink.write_record(&file_name, contents)?;
        tracing::info!("exported {} values -> {}", count, file_name);
        self.written.push(file_name.clone());
        Ok(file_name)
    }

    pub fn export_hex(&mut self, name: &str, codes: &[i32], format: QFormat, comment: Option<&str>) -> ExportResult<String> {
        let text = formats::render_hex(codes, format, comment);
        self.commit(format!("{}.hex", name), &text, codes.len())
    }

    pub fn export_mem(&mut self, name: &str, codes: &[i32], format: QFormat, comment: Option<&str>) -> ExportResult<String> {
        let text = formats::render_mem(codes, format, comment);
        self.commit(format!("{}.mem", name), &text, codes.len())
    }

    pub fn export_lut(&mut self, name: &str, codes: &[i32], format: QFormat, comment: Option<&str>) -> ExportResult<String> {
        let text = formats::render_lut(name, codes, format, comment);
        self.commit(format!("{}.v", name), &text, codes.len())
    }

    /// Hex, binary and lookup-table records for one coefficient set
    pub fn export_all(&mut self, name: &str, codes: &[i32], format: QFormat, comment: Option<&str>) -> ExportResult<ExportBundle> {
        Ok(ExportBundle {
            hex: self.export_hex(name, codes, format, comment)?,
            mem: self.export_mem(name, codes, format, comment)?,
            lut: self.export_lut(name, codes, format, comment)?,
        })
    }

    /// Quantize separate I and Q rails and write `{name}_I.hex` / `{name}_Q.hex`
    pub fn export_iq(
        &mut self,
        name: &str,
        i: &[RealSample],
        q: &[RealSample],
        format: QFormat,
        rounding: Rounding,
    ) -> ExportResult<IqExport> {
        if i.len() != q.len() {
            return Err(GdspError::IqLengthMismatch { i_len: i.len(), q_len: q.len() }.into());
        }
        let i_q = fixed_point::quantize(i, format, rounding);
        let q_q = fixed_point::quantize(q, format, rounding);
        self.export_iq_codes(name, &i_q.codes, &q_q.codes, format)?;

        Ok(IqExport { i: i_q, q: q_q })
    }

    /// Write already quantized rails under the same names and comments as `export_iq`
    pub fn export_iq_codes(&mut self, name: &str, i: &[i32], q: &[i32], format: QFormat) -> ExportResult<()> {
        if i.len() != q.len() {
            return Err(GdspError::IqLengthMismatch { i_len: i.len(), q_len: q.len() }.into());
        }
        self.export_hex(&format!("{}_I", name), i, format, Some(&format!("{} In-Phase samples", name)))?;
        self.export_hex(&format!("{}_Q", name), q, format, Some(&format!("{} Quadrature samples", name)))?;
        Ok(())
    }

    pub fn export_complex(&mut self, name: &str, samples: &[ComplexSample], format: QFormat, rounding: Rounding) -> ExportResult<IqExport> {
        let (i, q) = split_iq(samples);
        self.export_iq(name, &i, &q, format, rounding)
    }
}
