//! PCD (Point Cloud Data) format support
//!
//! Reads the `ascii`, `binary` and `binary_compressed` flavours of the PCL
//! point cloud format, keeping only the `x`, `y` and `z` fields. Writing
//! covers the `ascii` and `binary` flavours.

use crate::PointCloudReader;
use pcdseq_core::{PointCloud, Point3f, Result, Error};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Upper bound on elements reserved from header values before any data is read
const MAX_PREALLOC: usize = 1 << 20;

/// PCD data format variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdDataFormat {
    Ascii,
    Binary,
    BinaryCompressed,
}

/// PCD field data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdFieldType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl PcdFieldType {
    fn from_type_and_size(type_str: &str, size: usize) -> Result<Self> {
        let field_type = match (type_str, size) {
            ("I", 1) => PcdFieldType::I8,
            ("I", 2) => PcdFieldType::I16,
            ("I", 4) => PcdFieldType::I32,
            ("U", 1) => PcdFieldType::U8,
            ("U", 2) => PcdFieldType::U16,
            ("U", 4) => PcdFieldType::U32,
            ("F", 4) => PcdFieldType::F32,
            ("F", 8) => PcdFieldType::F64,
            _ => {
                return Err(Error::InvalidData(format!(
                    "Unknown field type/size combination: {}/{}",
                    type_str, size
                )))
            }
        };
        Ok(field_type)
    }

    /// Size in bytes of one element
    pub fn size(self) -> usize {
        match self {
            PcdFieldType::I8 | PcdFieldType::U8 => 1,
            PcdFieldType::I16 | PcdFieldType::U16 => 2,
            PcdFieldType::I32 | PcdFieldType::U32 | PcdFieldType::F32 => 4,
            PcdFieldType::F64 => 8,
        }
    }

    fn type_char(self) -> &'static str {
        match self {
            PcdFieldType::I8 | PcdFieldType::I16 | PcdFieldType::I32 => "I",
            PcdFieldType::U8 | PcdFieldType::U16 | PcdFieldType::U32 => "U",
            PcdFieldType::F32 | PcdFieldType::F64 => "F",
        }
    }

    /// Decode the element starting at `offset`
    fn decode_at(self, bytes: &[u8], offset: usize) -> Result<f64> {
        offset
            .checked_add(self.size())
            .and_then(|end| bytes.get(offset..end))
            .map(|element| self.decode_le(element))
            .ok_or_else(|| Error::InvalidData(format!("{:?} value at byte {} is out of range", self, offset)))
    }

    /// Decode one little-endian element; `bytes` must hold at least `size()` bytes
    fn decode_le(self, bytes: &[u8]) -> f64 {
        match self {
            PcdFieldType::I8 => bytes[0] as i8 as f64,
            PcdFieldType::U8 => bytes[0] as f64,
            PcdFieldType::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            PcdFieldType::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            PcdFieldType::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            PcdFieldType::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            PcdFieldType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            PcdFieldType::F64 => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }

    fn parse_ascii(self, token: &str) -> Result<f64> {
        let parsed = match self {
            PcdFieldType::F32 | PcdFieldType::F64 => token.parse::<f64>().ok(),
            _ => token.parse::<i64>().ok().map(|v| v as f64),
        };
        parsed.ok_or_else(|| Error::InvalidData(format!("Invalid {:?} value: {}", self, token)))
    }
}

/// PCD field definition
#[derive(Debug, Clone, PartialEq)]
pub struct PcdField {
    pub name: String,
    pub field_type: PcdFieldType,
    pub count: usize,
}

impl PcdField {
    pub fn new(name: impl Into<String>, field_type: PcdFieldType, count: usize) -> Self {
        Self {
            name: name.into(),
            field_type,
            count,
        }
    }

    /// Bytes taken by this field in one point record
    pub fn byte_len(&self) -> usize {
        self.field_type.size() * self.count
    }
}

/// PCD header information
#[derive(Debug, Clone, PartialEq)]
pub struct PcdHeader {
    pub version: String,
    pub fields: Vec<PcdField>,
    pub width: usize,
    pub height: usize,
    pub viewpoint: [f64; 7], // tx, ty, tz, qw, qx, qy, qz
    pub points: usize,
    pub data_format: PcdDataFormat,
}

impl PcdHeader {
    /// Bytes per point in the binary layouts
    pub fn point_step(&self) -> usize {
        self.fields.iter().map(PcdField::byte_len).sum()
    }

    /// Values per point in the ascii layout
    pub fn tokens_per_point(&self) -> usize {
        self.fields.iter().map(|f| f.count).sum()
    }

    /// Index of the named field together with its byte and token offsets
    fn locate(&self, name: &str) -> Option<FieldLocation> {
        let mut byte_offset = 0;
        let mut token_offset = 0;
        for (index, field) in self.fields.iter().enumerate() {
            if field.name == name {
                return Some(FieldLocation {
                    index,
                    byte_offset,
                    token_offset,
                    field_type: field.field_type,
                });
            }
            byte_offset += field.byte_len();
            token_offset += field.count;
        }
        None
    }

    /// Byte length of the whole data section in the binary layouts
    pub fn data_len(&self) -> Result<usize> {
        self.point_step()
            .checked_mul(self.points)
            .ok_or_else(|| Error::InvalidData("PCD data size overflows".to_string()))
    }

    fn xyz(&self) -> Result<[FieldLocation; 3]> {
        let find = |name: &str| {
            let loc = self
                .locate(name)
                .ok_or_else(|| Error::InvalidData(format!("PCD file has no '{}' field", name)))?;
            if self.fields[loc.index].count == 0 {
                return Err(Error::InvalidData(format!("PCD field '{}' has COUNT 0", name)));
            }
            Ok(loc)
        };
        Ok([find("x")?, find("y")?, find("z")?])
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldLocation {
    index: usize,
    byte_offset: usize,
    token_offset: usize,
    field_type: PcdFieldType,
}

/// Reader for PCD files
pub struct PcdReader;

impl PcdReader {
    /// Read a PCD file. Any failure is reported as [`Error::Load`] naming the file.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3f>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::load(path, e))?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader).map_err(|e| match e {
            Error::Load { .. } => e,
            other => Error::load(path, other),
        })
    }

    /// Read a PCD stream
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<PointCloud<Point3f>> {
        let header = Self::read_header(reader)?;
        let xyz = header.xyz()?;

        let points = match header.data_format {
            PcdDataFormat::Ascii => Self::read_ascii_points(reader, &header, &xyz)?,
            PcdDataFormat::Binary => Self::read_binary_points(reader, &header, &xyz)?,
            PcdDataFormat::BinaryCompressed => Self::read_compressed_points(reader, &header, &xyz)?,
        };

        // Organized clouds pad missing returns with NaN
        Ok(points
            .into_iter()
            .filter(|p| p.iter().all(|v| v.is_finite()))
            .collect())
    }

    /// Read the PCD header, leaving the reader positioned at the data section
    pub fn read_header<R: BufRead>(reader: &mut R) -> Result<PcdHeader> {
        let mut version = None;
        let mut names: Vec<String> = Vec::new();
        let mut sizes: Vec<usize> = Vec::new();
        let mut types: Vec<String> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        let mut width: Option<usize> = None;
        let mut height = None;
        let mut viewpoint = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        let mut points = None;
        let data_format;

        let mut line = String::new();
        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line)?;
            if bytes_read == 0 {
                return Err(Error::InvalidData("Unexpected end of file in PCD header".to_string()));
            }

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            let values = &parts[1..];

            match parts[0] {
                "VERSION" => version = values.first().map(|v| v.to_string()),
                "FIELDS" => names = values.iter().map(|v| v.to_string()).collect(),
                "SIZE" => sizes = parse_all(values, "SIZE")?,
                "TYPE" => types = values.iter().map(|v| v.to_string()).collect(),
                "COUNT" => counts = parse_all(values, "COUNT")?,
                "WIDTH" => width = Some(parse_one(values, "WIDTH")?),
                "HEIGHT" => height = Some(parse_one(values, "HEIGHT")?),
                "POINTS" => points = Some(parse_one(values, "POINTS")?),
                "VIEWPOINT" => {
                    let parsed: Vec<f64> = parse_all(values, "VIEWPOINT")?;
                    if parsed.len() != 7 {
                        return Err(Error::InvalidData(format!(
                            "VIEWPOINT needs 7 values, found {}",
                            parsed.len()
                        )));
                    }
                    viewpoint.copy_from_slice(&parsed);
                }
                "DATA" => {
                    data_format = match values.first().copied() {
                        Some("ascii") => PcdDataFormat::Ascii,
                        Some("binary") => PcdDataFormat::Binary,
                        Some("binary_compressed") => PcdDataFormat::BinaryCompressed,
                        other => {
                            return Err(Error::InvalidData(format!(
                                "Unknown PCD DATA format: {}",
                                other.unwrap_or("<missing>")
                            )))
                        }
                    };
                    break;
                }
                _ => {
                    // Unknown header keys are ignored
                }
            }
        }

        let version = version.unwrap_or_else(|| "0.7".to_string());
        let width = width.ok_or_else(|| Error::InvalidData("Missing WIDTH in PCD header".to_string()))?;
        let height = height.unwrap_or(1);

        if counts.is_empty() {
            counts = vec![1; names.len()];
        }
        if names.len() != sizes.len() || names.len() != types.len() || names.len() != counts.len() {
            return Err(Error::InvalidData(
                "Mismatch between FIELDS, SIZE, TYPE, and COUNT declarations".to_string(),
            ));
        }

        let fields = names
            .into_iter()
            .zip(sizes)
            .zip(types)
            .zip(counts)
            .map(|(((name, size), type_str), count)| {
                Ok(PcdField::new(name, PcdFieldType::from_type_and_size(&type_str, size)?, count))
            })
            .collect::<Result<Vec<_>>>()?;

        let step = fields
            .iter()
            .try_fold(0usize, |step, f| {
                f.field_type.size().checked_mul(f.count).and_then(|len| step.checked_add(len))
            })
            .ok_or_else(|| Error::InvalidData("PCD point record size overflows".to_string()))?;
        let tokens = fields.iter().try_fold(0usize, |total, f| total.checked_add(f.count));
        if step == 0 || tokens.is_none() {
            return Err(Error::InvalidData(format!(
                "PCD fields declare an invalid point record ({} bytes)",
                step
            )));
        }

        let organized = width.checked_mul(height).ok_or_else(|| {
            Error::InvalidData(format!("WIDTH * HEIGHT overflows ({} * {})", width, height))
        })?;
        let points = points.unwrap_or(organized);
        if points != organized {
            return Err(Error::InvalidData(format!(
                "POINTS ({}) doesn't match WIDTH * HEIGHT ({})",
                points, organized
            )));
        }

        Ok(PcdHeader {
            version,
            fields,
            width,
            height,
            viewpoint,
            points,
            data_format,
        })
    }

    fn read_ascii_points<R: BufRead>(
        reader: &mut R,
        header: &PcdHeader,
        xyz: &[FieldLocation; 3],
    ) -> Result<Vec<Point3f>> {
        let mut points = Vec::with_capacity(header.points.min(MAX_PREALLOC));
        let expected_tokens = header.tokens_per_point();
        let mut line = String::new();

        while points.len() < header.points {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(Error::InvalidData(format!(
                    "Expected {} points, found {}",
                    header.points,
                    points.len()
                )));
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            if tokens.len() < expected_tokens {
                return Err(Error::InvalidData(format!(
                    "Point {} has {} values, expected {}",
                    points.len(),
                    tokens.len(),
                    expected_tokens
                )));
            }

            let index = points.len();
            let coord = |loc: &FieldLocation| {
                let token = tokens.get(loc.token_offset).ok_or_else(|| {
                    Error::InvalidData(format!("Point {} is missing a coordinate", index))
                })?;
                loc.field_type.parse_ascii(token)
            };
            points.push(Point3f::new(
                coord(&xyz[0])? as f32,
                coord(&xyz[1])? as f32,
                coord(&xyz[2])? as f32,
            ));
        }

        Ok(points)
    }

    fn read_binary_points<R: Read>(
        reader: &mut R,
        header: &PcdHeader,
        xyz: &[FieldLocation; 3],
    ) -> Result<Vec<Point3f>> {
        let step = header.point_step();
        let data = read_section(reader, header.data_len()?, "binary PCD data")?;

        let coord = |record: &[u8], loc: &FieldLocation| -> Result<f32> {
            Ok(loc.field_type.decode_at(record, loc.byte_offset)? as f32)
        };

        data.chunks_exact(step)
            .map(|record| {
                Ok(Point3f::new(
                    coord(record, &xyz[0])?,
                    coord(record, &xyz[1])?,
                    coord(record, &xyz[2])?,
                ))
            })
            .collect()
    }

    fn read_compressed_points<R: Read>(
        reader: &mut R,
        header: &PcdHeader,
        xyz: &[FieldLocation; 3],
    ) -> Result<Vec<Point3f>> {
        let mut sizes = [0u8; 8];
        reader
            .read_exact(&mut sizes)
            .map_err(|e| Error::InvalidData(format!("Truncated compressed PCD header: {}", e)))?;
        let compressed_size = u32::from_le_bytes([sizes[0], sizes[1], sizes[2], sizes[3]]) as usize;
        let uncompressed_size = u32::from_le_bytes([sizes[4], sizes[5], sizes[6], sizes[7]]) as usize;

        let expected = header.data_len()?;
        if uncompressed_size != expected {
            return Err(Error::InvalidData(format!(
                "Compressed PCD declares {} bytes, header implies {}",
                uncompressed_size, expected
            )));
        }

        let compressed = read_section(reader, compressed_size, "compressed PCD data")?;
        let data = lzf_decompress(&compressed, uncompressed_size)?;

        // Field-major layout: every field's values for all points are contiguous
        let block_start = |loc: &FieldLocation| -> usize {
            header.fields[..loc.index]
                .iter()
                .map(|f| f.byte_len() * header.points)
                .sum()
        };
        let starts = [block_start(&xyz[0]), block_start(&xyz[1]), block_start(&xyz[2])];
        let strides = [
            header.fields[xyz[0].index].byte_len(),
            header.fields[xyz[1].index].byte_len(),
            header.fields[xyz[2].index].byte_len(),
        ];

        (0..header.points)
            .map(|i| {
                let coord = |axis: usize| -> Result<f32> {
                    let offset = i
                        .checked_mul(strides[axis])
                        .and_then(|o| o.checked_add(starts[axis]))
                        .ok_or_else(|| Error::InvalidData("PCD data offset overflows".to_string()))?;
                    Ok(xyz[axis].field_type.decode_at(&data, offset)? as f32)
                };
                Ok(Point3f::new(coord(0)?, coord(1)?, coord(2)?))
            })
            .collect()
    }
}

impl PointCloudReader for PcdReader {
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3f>> {
        Self::read_file(path)
    }
}

/// Writer for PCD files holding `x y z` float fields
pub struct PcdWriter;

impl PcdWriter {
    /// Write a point cloud to a PCD file
    pub fn write_file<P: AsRef<Path>>(
        cloud: &PointCloud<Point3f>,
        path: P,
        data_format: PcdDataFormat,
    ) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(cloud, &mut writer, data_format)?;
        writer.flush()?;
        Ok(())
    }

    /// Write a point cloud to a stream
    pub fn write_to<W: Write>(
        cloud: &PointCloud<Point3f>,
        writer: &mut W,
        data_format: PcdDataFormat,
    ) -> Result<()> {
        let header = PcdHeader {
            version: "0.7".to_string(),
            fields: ["x", "y", "z"]
                .iter()
                .map(|name| PcdField::new(*name, PcdFieldType::F32, 1))
                .collect(),
            width: cloud.len(),
            height: 1,
            viewpoint: [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            points: cloud.len(),
            data_format,
        };
        Self::write_header(writer, &header)?;

        match data_format {
            PcdDataFormat::Ascii => {
                for point in cloud.iter() {
                    writeln!(writer, "{} {} {}", point.x, point.y, point.z)?;
                }
            }
            PcdDataFormat::Binary => {
                for point in cloud.iter() {
                    writer.write_all(&point.x.to_le_bytes())?;
                    writer.write_all(&point.y.to_le_bytes())?;
                    writer.write_all(&point.z.to_le_bytes())?;
                }
            }
            PcdDataFormat::BinaryCompressed => {
                return Err(Error::Unsupported(
                    "Writing binary_compressed PCD files is not supported".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn write_header<W: Write>(writer: &mut W, header: &PcdHeader) -> Result<()> {
        writeln!(writer, "# .PCD v{} - Point Cloud Data file format", header.version)?;
        writeln!(writer, "VERSION {}", header.version)?;
        writeln!(writer, "FIELDS {}", field_line(&header.fields, |f| f.name.clone()))?;
        writeln!(writer, "SIZE {}", field_line(&header.fields, |f| f.field_type.size().to_string()))?;
        writeln!(writer, "TYPE {}", field_line(&header.fields, |f| f.field_type.type_char().to_string()))?;
        writeln!(writer, "COUNT {}", field_line(&header.fields, |f| f.count.to_string()))?;
        writeln!(writer, "WIDTH {}", header.width)?;
        writeln!(writer, "HEIGHT {}", header.height)?;
        let vp = header.viewpoint;
        writeln!(writer, "VIEWPOINT {} {} {} {} {} {} {}", vp[0], vp[1], vp[2], vp[3], vp[4], vp[5], vp[6])?;
        writeln!(writer, "POINTS {}", header.points)?;

        let data_str = match header.data_format {
            PcdDataFormat::Ascii => "ascii",
            PcdDataFormat::Binary => "binary",
            PcdDataFormat::BinaryCompressed => "binary_compressed",
        };
        writeln!(writer, "DATA {}", data_str)?;
        Ok(())
    }
}

/// Read exactly `len` bytes, growing the buffer only as data arrives
fn read_section<R: Read>(reader: &mut R, len: usize, what: &str) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(len.min(MAX_PREALLOC));
    reader.take(len as u64).read_to_end(&mut data)?;
    if data.len() != len {
        return Err(Error::InvalidData(format!(
            "Truncated {}: expected {} bytes, found {}",
            what,
            len,
            data.len()
        )));
    }
    Ok(data)
}

fn field_line(fields: &[PcdField], f: impl Fn(&PcdField) -> String) -> String {
    fields.iter().map(f).collect::<Vec<_>>().join(" ")
}

fn parse_one<T: std::str::FromStr>(values: &[&str], key: &str) -> Result<T> {
    let value = values
        .first()
        .ok_or_else(|| Error::InvalidData(format!("Missing {} value", key)))?;
    value
        .parse::<T>()
        .map_err(|_| Error::InvalidData(format!("Invalid {} value: {}", key, value)))
}

fn parse_all<T: std::str::FromStr>(values: &[&str], key: &str) -> Result<Vec<T>> {
    values
        .iter()
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| Error::InvalidData(format!("Invalid {} value: {}", key, v)))
        })
        .collect()
}

/// Decompress an LZF stream as written by PCL's `binary_compressed` writer.
pub fn lzf_decompress(input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let corrupt = |what: &str| Error::InvalidData(format!("Corrupt LZF stream: {}", what));
    let mut output = Vec::with_capacity(expected_len.min(MAX_PREALLOC));
    let mut i = 0;

    while i < input.len() {
        let ctrl = input[i] as usize;
        i += 1;

        if ctrl < 32 {
            // Literal run of ctrl + 1 bytes
            let len = ctrl + 1;
            let literal = input.get(i..i + len).ok_or_else(|| corrupt("literal past end"))?;
            output.extend_from_slice(literal);
            i += len;
        } else {
            // Back reference
            let mut len = ctrl >> 5;
            if len == 7 {
                len += *input.get(i).ok_or_else(|| corrupt("length past end"))? as usize;
                i += 1;
            }
            len += 2;

            let low = *input.get(i).ok_or_else(|| corrupt("offset past end"))? as usize;
            i += 1;
            let distance = ((ctrl & 0x1f) << 8) + low + 1;
            if distance > output.len() {
                return Err(corrupt("reference before start"));
            }

            let start = output.len() - distance;
            for k in 0..len {
                let byte = output[start + k];
                output.push(byte);
            }
        }

        if output.len() > expected_len {
            return Err(corrupt("output longer than declared"));
        }
    }

    if output.len() != expected_len {
        return Err(corrupt("output shorter than declared"));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ASCII_PCD: &str = "# .PCD v0.7 - Point Cloud Data file format
VERSION 0.7
FIELDS x y z intensity
SIZE 4 4 4 4
TYPE F F F F
COUNT 1 1 1 1
WIDTH 3
HEIGHT 1
VIEWPOINT 0 0 0 1 0 0 0
POINTS 3
DATA ascii
1.0 2.0 3.0 0.5
-1.5 0.0 2.25 0.1
4 5 6 0.9
";

    #[test]
    fn test_read_ascii() {
        let cloud = PcdReader::read_from(&mut Cursor::new(ASCII_PCD)).unwrap();
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud[0], Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(cloud[1], Point3f::new(-1.5, 0.0, 2.25));
        assert_eq!(cloud[2], Point3f::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_header_fields() {
        let header = PcdReader::read_header(&mut Cursor::new(ASCII_PCD)).unwrap();
        assert_eq!(header.version, "0.7");
        assert_eq!(header.fields.len(), 4);
        assert_eq!(header.fields[3].name, "intensity");
        assert_eq!(header.point_step(), 16);
        assert_eq!(header.points, 3);
        assert_eq!(header.data_format, PcdDataFormat::Ascii);
    }

    #[test]
    fn test_ascii_drops_nan_points() {
        let data = "VERSION 0.7\nFIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 2\nHEIGHT 1\nDATA ascii\nnan nan nan\n1 1 1\n";
        let cloud = PcdReader::read_from(&mut Cursor::new(data)).unwrap();
        assert_eq!(cloud.len(), 1);
        assert_eq!(cloud[0], Point3f::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_read_binary_with_extra_fields() {
        let mut bytes = b"VERSION 0.7\nFIELDS rgb x y z\nSIZE 4 4 4 8\nTYPE U F F F\nCOUNT 1 1 1 1\nWIDTH 2\nHEIGHT 1\nPOINTS 2\nDATA binary\n".to_vec();
        for (rgb, x, y, z) in [(7u32, 1.0f32, 2.0f32, 3.0f64), (9, -4.0, 5.5, -6.0)] {
            bytes.extend_from_slice(&rgb.to_le_bytes());
            bytes.extend_from_slice(&x.to_le_bytes());
            bytes.extend_from_slice(&y.to_le_bytes());
            bytes.extend_from_slice(&z.to_le_bytes());
        }

        let cloud = PcdReader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[0], Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(cloud[1], Point3f::new(-4.0, 5.5, -6.0));
    }

    #[test]
    fn test_truncated_binary_fails() {
        let mut bytes = b"VERSION 0.7\nFIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 2\nHEIGHT 1\nDATA binary\n".to_vec();
        bytes.extend_from_slice(&[0u8; 12]);
        assert!(PcdReader::read_from(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_read_binary_compressed() {
        let xs = [1.0f32, 2.0];
        let ys = [3.0f32, 4.0];
        let zs = [5.0f32, 6.0];
        let mut raw = Vec::new();
        for v in xs.iter().chain(ys.iter()).chain(zs.iter()) {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        // A single literal run encodes the 24 raw bytes
        let mut compressed = vec![(raw.len() - 1) as u8];
        compressed.extend_from_slice(&raw);

        let mut bytes = b"VERSION 0.7\nFIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 1\nWIDTH 2\nHEIGHT 1\nPOINTS 2\nDATA binary_compressed\n".to_vec();
        bytes.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(raw.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&compressed);

        let cloud = PcdReader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[0], Point3f::new(1.0, 3.0, 5.0));
        assert_eq!(cloud[1], Point3f::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_lzf_back_reference() {
        let compressed = [2, b'a', b'b', b'c', 128, 2];
        let out = lzf_decompress(&compressed, 9).unwrap();
        assert_eq!(out, b"abcabcabc");
    }

    #[test]
    fn test_lzf_rejects_bad_reference() {
        assert!(lzf_decompress(&[128, 5], 3).is_err());
        assert!(lzf_decompress(&[4, b'a'], 5).is_err());
    }

    #[test]
    fn test_missing_xyz_is_an_error() {
        let data = "VERSION 0.7\nFIELDS a b c\nSIZE 4 4 4\nTYPE F F F\nWIDTH 1\nHEIGHT 1\nDATA ascii\n1 2 3\n";
        assert!(PcdReader::read_from(&mut Cursor::new(data)).is_err());
    }

    #[test]
    fn test_write_then_read_binary() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.5, -2.0, 3.25),
        ]);

        let mut bytes = Vec::new();
        PcdWriter::write_to(&cloud, &mut bytes, PcdDataFormat::Binary).unwrap();
        let loaded = PcdReader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(loaded, cloud);
    }

    fn binary_header(fields: &str) -> Vec<u8> {
        format!("VERSION 0.7\n{}\nDATA binary\n", fields).into_bytes()
    }

    #[test]
    fn test_zero_count_coordinate_is_rejected() {
        let ascii = "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 0\nWIDTH 1\nDATA ascii\n1 2\n";
        assert!(matches!(
            PcdReader::read_from(&mut Cursor::new(ascii)),
            Err(Error::InvalidData(_))
        ));

        let mut binary = binary_header("FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 0\nWIDTH 1");
        binary.extend_from_slice(&[0u8; 8]);
        assert!(PcdReader::read_from(&mut Cursor::new(binary)).is_err());
    }

    #[test]
    fn test_empty_point_record_is_rejected() {
        let mut bytes = binary_header("FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 0 0 0\nWIDTH 1");
        bytes.extend_from_slice(&[0u8; 12]);
        assert!(matches!(
            PcdReader::read_from(&mut Cursor::new(bytes)),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_huge_counts_are_rejected() {
        let header = format!(
            "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 {}\nWIDTH 1",
            usize::MAX
        );
        assert!(PcdReader::read_header(&mut Cursor::new(binary_header(&header))).is_err());
    }

    #[test]
    fn test_overflowing_dimensions_are_rejected() {
        let bytes = binary_header(
            "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 4294967296\nHEIGHT 4294967296",
        );
        assert!(matches!(
            PcdReader::read_header(&mut Cursor::new(bytes)),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_declared_size_beyond_data_fails_without_allocating() {
        let mut bytes = binary_header("FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 100000000000000");
        bytes.extend_from_slice(&[0u8; 12]);
        assert!(matches!(
            PcdReader::read_from(&mut Cursor::new(bytes)),
            Err(Error::InvalidData(_))
        ));

        let ascii = "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 100000000000000\nDATA ascii\n1 2 3\n";
        assert!(PcdReader::read_from(&mut Cursor::new(ascii)).is_err());
    }

    #[test]
    fn test_compressed_size_beyond_data_fails() {
        let mut bytes = b"VERSION 0.7\nFIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH 1\nDATA binary_compressed\n".to_vec();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&12u32.to_le_bytes());
        bytes.extend_from_slice(&[11, 0, 0]);
        assert!(matches!(
            PcdReader::read_from(&mut Cursor::new(bytes)),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_decode_at_checks_bounds() {
        assert!(PcdFieldType::F32.decode_at(&[0u8; 4], 1).is_err());
        assert!(PcdFieldType::F64.decode_at(&[0u8; 8], usize::MAX).is_err());
        assert_eq!(PcdFieldType::U16.decode_at(&[0, 1, 2], 1).unwrap(), 513.0);
    }
}
