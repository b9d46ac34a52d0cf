//! Reading and writing single NumPy `.npy` arrays.
//!
//! Only what a weight archive needs: a header with `descr`, `fortran_order`
//! and `shape`, followed by the raw element bytes. Elements are decoded to
//! `f32` on request.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::EvalError;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Header plus payload alignment used when writing.
const ALIGN: usize = 64;

/// Byte order of the stored elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
    /// Single-byte elements (`|`).
    NotApplicable,
}

/// Element type parsed from a `descr` string such as `<f4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dtype {
    pub endian: Endian,
    /// NumPy kind character: `f` float, `i` signed, `u` unsigned, ...
    pub kind: char,
    pub width: usize,
}

impl Dtype {
    pub const F32_LE: Dtype = Dtype { endian: Endian::Little, kind: 'f', width: 4 };

    fn parse(descr: &str) -> Option<Dtype> {
        let mut chars = descr.chars();
        let endian = match chars.next()? {
            '<' => Endian::Little,
            '>' => Endian::Big,
            '|' => Endian::NotApplicable,
            '=' if cfg!(target_endian = "big") => Endian::Big,
            '=' => Endian::Little,
            _ => return None,
        };
        let kind = chars.next()?;
        let width = chars.as_str().parse().ok().filter(|&w| w > 0)?;
        Some(Dtype { endian, kind, width })
    }

    /// `descr` string for this type.
    pub fn descr(&self) -> String {
        let order = match self.endian {
            Endian::Little => '<',
            Endian::Big => '>',
            Endian::NotApplicable => '|',
        };
        format!("{order}{}{}", self.kind, self.width)
    }

    fn is_f32(&self) -> bool {
        self.kind == 'f' && self.width == 4 && self.endian != Endian::NotApplicable
    }
}

/// A decoded `.npy` array: shape, element type and the raw bytes in C order.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    shape: Vec<usize>,
    dtype: Dtype,
    data: Vec<u8>,
}

impl NpyArray {
    /// Build an array from raw element bytes in C order.
    pub fn new(name: &str, shape: Vec<usize>, dtype: Dtype, data: Vec<u8>) -> Result<Self, EvalError> {
        let expected = element_count(&shape)
            .and_then(|count| count.checked_mul(dtype.width))
            .ok_or_else(|| EvalError::malformed(name, format!("shape {shape:?} is too large")))?;
        if data.len() != expected {
            return Err(EvalError::malformed(
                name,
                format!("{} data bytes, shape {shape:?} needs {expected}", data.len()),
            ));
        }
        Ok(Self { shape, dtype, data })
    }

    /// Little-endian `f32` array. `values` must hold `product(shape)` elements.
    pub fn from_f32(name: &str, shape: Vec<usize>, values: &[f32]) -> Result<Self, EvalError> {
        let mut data = vec![0; values.len() * 4];
        LittleEndian::write_f32_into(values, &mut data);
        Self::new(name, shape, Dtype::F32_LE, data)
    }

    /// Parse a complete `.npy` file. `name` is only used in errors.
    pub fn parse(name: &str, bytes: &[u8]) -> Result<Self, EvalError> {
        let mut reader = bytes;
        let mut magic = [0u8; 6];
        reader
            .read_exact(&mut magic)
            .map_err(|_| EvalError::malformed(name, "truncated magic"))?;
        if &magic != MAGIC {
            return Err(EvalError::malformed(name, "not an .npy file"));
        }

        let mut version = [0u8; 2];
        reader
            .read_exact(&mut version)
            .map_err(|_| EvalError::malformed(name, "truncated version"))?;
        let header_len = match version[0] {
            1 => reader.read_u16::<LittleEndian>().map(usize::from),
            2 | 3 => reader.read_u32::<LittleEndian>().map(|n| n as usize),
            other => {
                return Err(EvalError::malformed(name, format!("unsupported format version {other}")));
            }
        }
        .map_err(|_| EvalError::malformed(name, "truncated header length"))?;

        if reader.len() < header_len {
            return Err(EvalError::malformed(name, "truncated header"));
        }
        let (header, payload) = reader.split_at(header_len);
        let header = std::str::from_utf8(header)
            .map_err(|_| EvalError::malformed(name, "header is not text"))?;

        let descr = dict_value(header, "descr")
            .and_then(quoted)
            .ok_or_else(|| EvalError::malformed(name, "header has no descr"))?;
        let dtype = Dtype::parse(descr)
            .ok_or_else(|| EvalError::malformed(name, format!("unrecognised descr `{descr}`")))?;
        let fortran_order = match dict_value(header, "fortran_order") {
            Some(v) if v.starts_with("True") => true,
            Some(v) if v.starts_with("False") => false,
            _ => return Err(EvalError::malformed(name, "header has no fortran_order")),
        };
        let shape = dict_value(header, "shape")
            .and_then(parse_shape)
            .ok_or_else(|| EvalError::malformed(name, "header has no valid shape"))?;

        let array = Self::new(name, shape, dtype, payload.to_vec())?;
        Ok(if fortran_order { array.into_c_order() } else { array })
    }

    /// Serialise as a version 1.0 `.npy` file.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let shape = match self.shape.as_slice() {
            [n] => format!("({n},)"),
            dims => format!(
                "({})",
                dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
            ),
        };
        let mut header = format!(
            "{{'descr': '{}', 'fortran_order': False, 'shape': {shape}, }}",
            self.dtype.descr()
        );
        // Pad with spaces so the payload starts aligned; the header ends in '\n'.
        let unpadded = MAGIC.len() + 4 + header.len() + 1;
        header.extend(std::iter::repeat_n(' ', (ALIGN - unpadded % ALIGN) % ALIGN));
        header.push('\n');

        let header_len = u16::try_from(header.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "npy header too long"))?;
        writer.write_all(MAGIC)?;
        writer.write_u8(1)?;
        writer.write_u8(0)?;
        writer.write_u16::<LittleEndian>(header_len)?;
        writer.write_all(header.as_bytes())?;
        writer.write_all(&self.data)
    }

    /// Decode the elements as `f32`, in C order.
    pub fn to_f32(&self, name: &str) -> Result<Vec<f32>, EvalError> {
        if !self.dtype.is_f32() {
            return Err(EvalError::UnsupportedElementWidth {
                name: name.to_string(),
                descr: self.dtype.descr(),
            });
        }
        let mut values = vec![0.0; self.data.len() / 4];
        match self.dtype.endian {
            Endian::Big => BigEndian::read_f32_into(&self.data, &mut values),
            _ => LittleEndian::read_f32_into(&self.data, &mut values),
        }
        Ok(values)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> &Dtype {
        &self.dtype
    }

    pub fn len(&self) -> usize {
        // `new` rejects shapes whose element count overflows.
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reorder a column-major payload into row-major.
    fn into_c_order(self) -> Self {
        if self.shape.len() < 2 {
            return self;
        }
        let width = self.dtype.width;
        let count = self.len();
        let mut data = vec![0u8; self.data.len()];
        let mut index = vec![0usize; self.shape.len()];
        for c_pos in 0..count {
            // Fortran offset: first axis varies fastest.
            let mut f_pos = 0;
            let mut stride = 1;
            for (&i, &dim) in index.iter().zip(&self.shape) {
                f_pos += i * stride;
                stride *= dim;
            }
            data[c_pos * width..(c_pos + 1) * width]
                .copy_from_slice(&self.data[f_pos * width..(f_pos + 1) * width]);

            // Advance the C-order multi-index, last axis fastest.
            for axis in (0..index.len()).rev() {
                index[axis] += 1;
                if index[axis] < self.shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        Self { data, ..self }
    }
}

fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |count, &dim| count.checked_mul(dim))
}

/// Text following `'key':` in a Python dict literal.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{key}'");
    let start = header.find(&pattern)? + pattern.len();
    let rest = header[start..].trim_start();
    Some(rest.strip_prefix(':')?.trim_start())
}

fn quoted(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &value[1..];
    Some(&rest[..rest.find(quote)?])
}

fn parse_shape(value: &str) -> Option<Vec<usize>> {
    let inner = value.strip_prefix('(')?;
    let inner = &inner[..inner.find(')')?];
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('L').parse().ok())
        .collect()
}
