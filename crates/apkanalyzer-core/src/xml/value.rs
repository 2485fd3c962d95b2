//! Rendering of typed attribute values (`Res_value`).

use super::chunk::StringPool;
use crate::Result;

const TYPE_NULL: u8 = 0x00;
const TYPE_REFERENCE: u8 = 0x01;
const TYPE_ATTRIBUTE: u8 = 0x02;
const TYPE_STRING: u8 = 0x03;
const TYPE_FLOAT: u8 = 0x04;
const TYPE_DIMENSION: u8 = 0x05;
const TYPE_FRACTION: u8 = 0x06;
const TYPE_INT_DEC: u8 = 0x10;
const TYPE_INT_HEX: u8 = 0x11;
const TYPE_INT_BOOLEAN: u8 = 0x12;
const TYPE_FIRST_COLOR_INT: u8 = 0x1c;
const TYPE_LAST_COLOR_INT: u8 = 0x1f;

const COMPLEX_UNIT_MASK: u32 = 0x0f;
const COMPLEX_RADIX_SHIFT: u32 = 4;
const COMPLEX_RADIX_MASK: u32 = 0x03;
const COMPLEX_MANTISSA_SHIFT: u32 = 8;
const COMPLEX_MANTISSA_MASK: u32 = 0x00ff_ffff;

const RADIX_MULTIPLIERS: [f64; 4] = [
    1.0 / 256.0,
    1.0 / 32_768.0,
    1.0 / 8_388_608.0,
    1.0 / 2_147_483_648.0,
];

const DIMENSION_UNITS: [&str; 6] = ["px", "dp", "sp", "pt", "in", "mm"];
const FRACTION_UNITS: [&str; 2] = ["%", "%p"];

/// A typed attribute value as stored in a compiled XML attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedValue {
    /// `Res_value::dataType`.
    pub data_type: u8,
    /// `Res_value::data`.
    pub data: u32,
}

impl TypedValue {
    /// Creates a value from its raw type tag and payload.
    pub const fn new(data_type: u8, data: u32) -> Self {
        Self { data_type, data }
    }

    /// Formats the value the way `aapt dump xmltree` prints it.
    ///
    /// # Errors
    ///
    /// Fails if a string-typed value points outside `pool`.
    pub(crate) fn render(self, pool: &StringPool) -> Result<String> {
        let data = self.data;
        Ok(match self.data_type {
            TYPE_NULL => String::new(),
            TYPE_REFERENCE => format!("@0x{data:08x}"),
            TYPE_ATTRIBUTE => format!("?0x{data:08x}"),
            TYPE_STRING => pool.require(data)?.to_string(),
            TYPE_FLOAT => f32::from_bits(data).to_string(),
            TYPE_DIMENSION => complex(data, &DIMENSION_UNITS, 1.0),
            TYPE_FRACTION => complex(data, &FRACTION_UNITS, 100.0),
            TYPE_INT_DEC => (data as i32).to_string(),
            TYPE_INT_HEX => format!("0x{data:x}"),
            TYPE_INT_BOOLEAN => (data != 0).to_string(),
            TYPE_FIRST_COLOR_INT..=TYPE_LAST_COLOR_INT => format!("#{data:08x}"),
            _ => format!("0x{data:08x}"),
        })
    }
}

fn complex(data: u32, units: &[&str], scale: f64) -> String {
    // the radix multipliers already account for the mantissa shift
    let mantissa = f64::from((data & (COMPLEX_MANTISSA_MASK << COMPLEX_MANTISSA_SHIFT)) as i32);
    let radix = ((data >> COMPLEX_RADIX_SHIFT) & COMPLEX_RADIX_MASK) as usize;
    let value = mantissa * RADIX_MULTIPLIERS[radix] * scale;
    let unit = units
        .get((data & COMPLEX_UNIT_MASK) as usize)
        .copied()
        .unwrap_or("");
    format!("{value}{unit}")
}
