//! Binary format for per-generation parameter snapshots.

use std::io::{self, Read, Write};

use crate::compute::{Individual, Lineage};

/// Magic bytes identifying a parameter snapshot file.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"GAPS";

/// Current format version.
pub const SNAPSHOT_VERSION: u16 = 2;

/// File header for a parameter snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Parameters per individual.
    pub num_params: u32,
    /// Population size.
    pub num_parent: u32,
    /// Generation the snapshot was taken after.
    pub generation: u64,
    /// Next job id the engine would have handed out.
    pub next_job_id: u64,
}

impl SnapshotHeader {
    /// Size of header in bytes.
    /// Magic(4) + Version(2) + Reserved(2) + NumParams(4) + NumParent(4) +
    /// Generation(8) + NextJobId(8) + Reserved(16) = 48
    pub const SIZE: usize = 48;

    /// Size of the body that follows the header.
    pub fn body_size(&self) -> usize {
        let n = self.num_parent as usize;
        n * 8 * 2 + n * self.num_params as usize * 8
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(SNAPSHOT_MAGIC)?;
        w.write_all(&SNAPSHOT_VERSION.to_le_bytes())?;
        w.write_all(&[0u8; 2])?;
        w.write_all(&self.num_params.to_le_bytes())?;
        w.write_all(&self.num_parent.to_le_bytes())?;
        w.write_all(&self.generation.to_le_bytes())?;
        w.write_all(&self.next_job_id.to_le_bytes())?;
        w.write_all(&[0u8; 16])?;
        Ok(())
    }

    /// Read header from input.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != SNAPSHOT_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid GAPS magic bytes",
            ));
        }

        let mut buf2 = [0u8; 2];
        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf2)?;
        let version = u16::from_le_bytes(buf2);
        if version != SNAPSHOT_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported GAPS version: {}", version),
            ));
        }
        r.read_exact(&mut buf2)?;

        r.read_exact(&mut buf4)?;
        let num_params = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf4)?;
        let num_parent = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf8)?;
        let generation = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf8)?;
        let next_job_id = u64::from_le_bytes(buf8);

        let mut reserved = [0u8; 16];
        r.read_exact(&mut reserved)?;

        Ok(Self {
            num_params,
            num_parent,
            generation,
            next_job_id,
        })
    }
}

/// Full parameter matrix and lineage vector of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub header: SnapshotHeader,
    /// Lineage per slot.
    pub lineage: Vec<Lineage>,
    /// Fitness per slot, bit-exact.
    pub fitness: Vec<f64>,
    /// Parameter vector per slot.
    pub params: Vec<Vec<f64>>,
}

impl Snapshot {
    /// Capture a population.
    pub fn capture<'a, I>(individuals: I, generation: u64, next_job_id: u64) -> Self
    where
        I: IntoIterator<Item = &'a Individual>,
    {
        let mut lineage = Vec::new();
        let mut fitness = Vec::new();
        let mut params = Vec::new();
        for ind in individuals {
            lineage.push(ind.lineage);
            fitness.push(ind.fitness);
            params.push(ind.params.clone());
        }
        let num_params = params.first().map_or(0, Vec::len);

        Self {
            header: SnapshotHeader {
                num_params: num_params as u32,
                num_parent: params.len() as u32,
                generation,
                next_job_id,
            },
            lineage,
            fitness,
            params,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.header.write_to(w)?;
        for lineage in &self.lineage {
            w.write_all(&lineage.as_raw().to_le_bytes())?;
        }
        w.write_all(&encode_row(&self.fitness))?;
        for row in &self.params {
            w.write_all(&encode_row(row))?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let header = SnapshotHeader::read_from(r)?;
        let n = header.num_parent as usize;
        let p = header.num_params as usize;

        let mut buf8 = [0u8; 8];
        let mut lineage = Vec::with_capacity(n);
        for _ in 0..n {
            r.read_exact(&mut buf8)?;
            lineage.push(Lineage::from_raw(i64::from_le_bytes(buf8)));
        }

        let mut bytes = vec![0u8; n * 8];
        r.read_exact(&mut bytes)?;
        let mut fitness = vec![0.0f64; n];
        decode_row(&bytes, &mut fitness)?;

        let mut bytes = vec![0u8; p * 8];
        let mut params = Vec::with_capacity(n);
        for _ in 0..n {
            r.read_exact(&mut bytes)?;
            let mut row = vec![0.0f64; p];
            decode_row(&bytes, &mut row)?;
            params.push(row);
        }

        Ok(Self {
            header,
            lineage,
            fitness,
            params,
        })
    }
}

/// Encode f64 slice to bytes.
pub fn encode_row(data: &[f64]) -> Vec<u8> {
    let mut bytes = vec![0u8; data.len() * 8];
    for (i, &v) in data.iter().enumerate() {
        bytes[i * 8..(i + 1) * 8].copy_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode bytes to f64 slice.
pub fn decode_row(bytes: &[u8], output: &mut [f64]) -> io::Result<()> {
    if bytes.len() != output.len() * 8 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Row size mismatch: {} bytes vs {} floats",
                bytes.len(),
                output.len()
            ),
        ));
    }
    for (v, chunk) in output.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut b = [0u8; 8];
        b.copy_from_slice(chunk);
        *v = f64::from_le_bytes(b);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_size() {
        let header = SnapshotHeader {
            num_params: 20,
            num_parent: 50,
            generation: 1000,
            next_job_id: 20_000,
        };

        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), SnapshotHeader::SIZE);

        let decoded = SnapshotHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_snapshot_layout() {
        let individuals = vec![
            Individual {
                params: vec![1.5, -2.0, 0.25],
                fitness: 1.0,
                lineage: Lineage::Initial,
            },
            Individual {
                params: vec![0.0, 3.0, -0.5],
                fitness: f64::NAN,
                lineage: Lineage::Job(17),
            },
        ];
        let snapshot = Snapshot::capture(&individuals, 4, 40);

        let mut buf = Vec::new();
        snapshot.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), SnapshotHeader::SIZE + snapshot.header.body_size());

        let decoded = Snapshot::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded.header, snapshot.header);
        assert_eq!(decoded.params, snapshot.params);
        assert_eq!(decoded.lineage, vec![Lineage::Initial, Lineage::Job(17)]);
        assert_eq!(decoded.fitness[0], 1.0);
        assert!(decoded.fitness[1].is_nan());
    }

    #[test]
    fn test_snapshot_keeps_exact_fitness() {
        let individuals: Vec<Individual> = [-5.63e-7, -2.667e-6, 4.9e-300, -0.0]
            .iter()
            .enumerate()
            .map(|(i, &fitness)| Individual {
                params: vec![i as f64],
                fitness,
                lineage: Lineage::Job(i as u64),
            })
            .collect();

        let mut buf = Vec::new();
        Snapshot::capture(&individuals, 2, 9)
            .write_to(&mut buf)
            .unwrap();
        let decoded = Snapshot::read_from(&mut Cursor::new(&buf)).unwrap();

        for (ind, fitness) in individuals.iter().zip(&decoded.fitness) {
            assert_eq!(ind.fitness.to_bits(), fitness.to_bits());
        }
    }

    #[test]
    fn test_old_version_rejected() {
        let mut buf = Vec::new();
        SnapshotHeader {
            num_params: 1,
            num_parent: 1,
            generation: 1,
            next_job_id: 1,
        }
        .write_to(&mut buf)
        .unwrap();
        buf[4..6].copy_from_slice(&1u16.to_le_bytes());

        let err = SnapshotHeader::read_from(&mut Cursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut buf = vec![0u8; SnapshotHeader::SIZE];
        buf[..4].copy_from_slice(b"FLWA");
        let err = SnapshotHeader::read_from(&mut Cursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_snapshot_rejected() {
        let individuals = vec![Individual {
            params: vec![1.0, 2.0],
            fitness: 0.0,
            lineage: Lineage::Job(1),
        }];
        let mut buf = Vec::new();
        Snapshot::capture(&individuals, 1, 2)
            .write_to(&mut buf)
            .unwrap();
        buf.truncate(buf.len() - 4);

        assert!(Snapshot::read_from(&mut Cursor::new(&buf)).is_err());
    }
}
