//! Mesh output implementation
use super::Mesh;
use std::io::{BufWriter, Write};

impl Mesh {
    /// Writes a binary STL to the given output
    ///
    /// Coordinates are written in the mesh's own `(x, height, y)` order.
    pub fn write_stl<F: std::io::Write>(
        &self,
        out: &mut F,
    ) -> Result<(), crate::Error> {
        let mut out = BufWriter::new(out);
        const HEADER: &[u8] = b"This is a binary STL file exported by Planar";
        static_assertions::const_assert!(HEADER.len() <= 80);
        out.write_all(HEADER)?;
        out.write_all(&[0u8; 80 - HEADER.len()])?;

        let count = u32::try_from(self.triangles.len())
            .map_err(|_| crate::Error::MeshTooLarge(self.triangles.len()))?;
        out.write_all(&count.to_le_bytes())?;
        for t in &self.triangles {
            let [a, b, c] = [t.x, t.y, t.z].map(|i| self.vertices[i as usize]);
            let normal = (b - a).cross(&(c - a));
            for p in normal.iter().chain(&a).chain(&b).chain(&c) {
                out.write_all(&p.to_le_bytes())?;
            }
            out.write_all(&[0u8; std::mem::size_of::<u16>()])?; // attributes
        }
        out.flush()?;
        Ok(())
    }
}
