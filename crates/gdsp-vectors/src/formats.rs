//! Text renderers for the three vector record types.
//!
//! All renderers are pure: the same codes, format and comment always produce
//! the same bytes.

use std::fmt::Write;

use gdsp_core::QFormat;
use gdsp_core::fixed_point::{dequantize_value, to_unsigned_twos_complement};

fn header(out: &mut String, codes: &[i32], format: QFormat, comment: Option<&str>) {
    if let Some(c) = comment.filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "// {}", c);
    }
    let _ = writeln!(out, "// Format: {}, {} values", format, codes.len());
}

fn raw(code: i32, format: QFormat) -> u64 {
    to_unsigned_twos_complement(code as i64, format.total_bits())
}

/// One upper-case hex word per line, for `$readmemh`
pub fn render_hex(codes: &[i32], format: QFormat, comment: Option<&str>) -> String {
    let mut out = String::new();
    header(&mut out, codes, format, comment);
    let width = format.hex_digits();
    for &c in codes {
        let _ = writeln!(out, "{:0width$X}", raw(c, format), width = width);
    }
    out
}

/// One binary word per line, for `$readmemb`
pub fn render_mem(codes: &[i32], format: QFormat, comment: Option<&str>) -> String {
    let mut out = String::new();
    header(&mut out, codes, format, comment);
    let width = format.total_bits() as usize;
    for &c in codes {
        let _ = writeln!(out, "{:0width$b}", raw(c, format), width = width);
    }
    out
}

/// Function name for a lookup table: "RRC_COEFFS" -> "rrc_coeff"
pub fn lut_function_name(name: &str) -> String {
    let base = name.to_lowercase();
    let base = base.trim_end_matches('s');
    if base.ends_with("coeff") {
        base.to_string()
    } else {
        format!("{}_coeff", base)
    }
}

/// Verilog-2001 include holding the codes in a `case`-based lookup function
pub fn render_lut(name: &str, codes: &[i32], format: QFormat, comment: Option<&str>) -> String {
    let func = lut_function_name(name);
    let w = format.total_bits();
    let digits = format.hex_digits();
    let mut out = String::new();

    let _ = writeln!(out, "// Auto-generated by G-DSP Golden Model");
    if let Some(c) = comment.filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "// {}", c);
    }
    let _ = writeln!(out, "// Format: {}, {} coefficients", format, codes.len());
    let _ = writeln!(out, "// DO NOT EDIT -- regenerate with gdsp-golden-model");
    out.push('\n');

    let _ = writeln!(out, "localparam integer NUM_{} = {};", name.to_uppercase(), codes.len());
    out.push('\n');

    let _ = writeln!(out, "function signed [{}:0] {};", w - 1, func);
    let _ = writeln!(out, "    input integer idx;");
    let _ = writeln!(out, "    case (idx)");
    for (i, &c) in codes.iter().enumerate() {
        let _ = writeln!(
            out,
            "        {:2}: {} = {}'sh{:0digits$X};  // {:+6}  ({:+.6})",
            i,
            func,
            w,
            raw(c, format),
            c,
            dequantize_value(c, format),
            digits = digits
        );
    }
    let _ = writeln!(out, "        default: {} = {}'sh{:0digits$X};", func, w, 0, digits = digits);
    let _ = writeln!(out, "    endcase");
    let _ = writeln!(out, "endfunction");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsp_core::Q1_11;

    #[test]
    fn test_render_hex() {
        let text = render_hex(&[0, -1, 2047, -2048, 922], Q1_11, Some("RRC test"));
        let expected = "\
// RRC test
// Format: Q1.11 (12-bit signed), 5 values
000
FFF
7FF
800
39A
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_hex_without_comment() {
        let text = render_hex(&[1], Q1_11, None);
        assert_eq!(text, "// Format: Q1.11 (12-bit signed), 1 values\n001\n");
        assert_eq!(render_hex(&[1], Q1_11, Some("")), text);
    }

    #[test]
    fn test_render_mem() {
        let text = render_mem(&[-1, 5], Q1_11, None);
        assert_eq!(text, "// Format: Q1.11 (12-bit signed), 2 values\n111111111111\n000000000101\n");
    }

    #[test]
    fn test_lut_function_name() {
        assert_eq!(lut_function_name("RRC_COEFFS"), "rrc_coeff");
        assert_eq!(lut_function_name("rrc_coeffs"), "rrc_coeff");
        assert_eq!(lut_function_name("coeff"), "coeff");
        assert_eq!(lut_function_name("taps"), "tap_coeff");
        assert_eq!(lut_function_name("pilot"), "pilot_coeff");
    }

    #[test]
    fn test_render_lut() {
        let text = render_lut("rrc_coeffs", &[-3, 922], Q1_11, Some("RRC a=0.25"));
        let expected = "\
// Auto-generated by G-DSP Golden Model
// RRC a=0.25
// Format: Q1.11 (12-bit signed), 2 coefficients
// DO NOT EDIT -- regenerate with gdsp-golden-model

localparam integer NUM_RRC_COEFFS = 2;

function signed [11:0] rrc_coeff;
    input integer idx;
    case (idx)
         0: rrc_coeff = 12'shFFD;  //     -3  (-0.001465)
         1: rrc_coeff = 12'sh39A;  //   +922  (+0.450195)
        default: rrc_coeff = 12'sh000;
    endcase
endfunction
";
        assert_eq!(text, expected);
    }
}
