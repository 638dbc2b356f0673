use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bytemuck::NoUninit;
use glam::{Vec2, Vec3};
use tracing::info;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffer {
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Unit cube centred on the origin, 4 vertices per face so normals stay flat.
    pub fn cube() -> Self {
        // (normal, tangent u, tangent v) per face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ];
        // (corner offset along u/v, texture coordinate)
        let corners: [([f32; 2], [f32; 2]); 4] = [
            ([-0.5, -0.5], [0.0, 1.0]),
            ([0.5, -0.5], [1.0, 1.0]),
            ([0.5, 0.5], [1.0, 0.0]),
            ([-0.5, 0.5], [0.0, 0.0]),
        ];

        let mut mesh = Mesh::default();
        for (normal, u_axis, v_axis) in faces {
            let n = Vec3::from(normal);
            let (u_axis, v_axis) = (Vec3::from(u_axis), Vec3::from(v_axis));
            let base = mesh.vertices.len() as u32;
            for ([cu, cv], uv) in corners {
                let pos = n * 0.5 + u_axis * cu + v_axis * cv;
                mesh.vertices.push(Vertex { pos: pos.to_array(), normal, uv });
            }
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }

    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model {}", path.display()))?;
        let mesh = Self::from_obj_str(&data)
            .with_context(|| format!("failed to parse model {}", path.display()))?;
        info!(
            path = %path.display(),
            vertices = mesh.vertices.len(),
            indices = mesh.indices.len(),
            "model loaded"
        );
        Ok(mesh)
    }

    /// Parses positions, texture coordinates, normals and polygon faces of a
    /// Wavefront OBJ. Polygons are fan-triangulated; missing normals are
    /// recomputed from the faces.
    pub fn from_obj_str(data: &str) -> Result<Self> {
        let mut positions = Vec::new();
        let mut texcoords = Vec::new();
        let mut normals = Vec::new();
        let mut triangles: Vec<[FaceIndex; 3]> = Vec::new();

        for (line_no, line) in data.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut parts = trimmed.split_whitespace();
            let Some(tag) = parts.next() else { continue };
            match tag {
                "v" => positions.push(
                    parse_floats::<3>(parts)
                        .map(Vec3::from)
                        .with_context(|| format!("invalid vertex on line {}", line_no + 1))?,
                ),
                "vt" => texcoords.push(
                    parse_floats::<2>(parts)
                        .map(Vec2::from)
                        .with_context(|| format!("invalid texcoord on line {}", line_no + 1))?,
                ),
                "vn" => normals.push(
                    parse_floats::<3>(parts)
                        .map(Vec3::from)
                        .with_context(|| format!("invalid normal on line {}", line_no + 1))?,
                ),
                "f" => {
                    let polygon = parse_face(parts)
                        .with_context(|| format!("invalid face on line {}", line_no + 1))?;
                    for i in 1..polygon.len() - 1 {
                        triangles.push([polygon[0], polygon[i], polygon[i + 1]]);
                    }
                }
                _ => {}
            }
        }

        if positions.is_empty() {
            return Err(anyhow!("OBJ data does not define any vertices"));
        }

        let mut lookup: HashMap<FaceIndex, u32> = HashMap::new();
        let mut mesh = Mesh::default();
        let mut missing_normals = false;
        for corner in triangles.iter().flatten() {
            if let Some(index) = lookup.get(corner) {
                mesh.indices.push(*index);
                continue;
            }
            let pos = resolve(corner.v, &positions).ok_or_else(|| anyhow!("vertex index {} out of range", corner.v))?;
            let uv = resolve(corner.vt, &texcoords).unwrap_or(Vec2::ZERO);
            let normal = resolve(corner.vn, &normals).unwrap_or_else(|| {
                missing_normals = true;
                Vec3::ZERO
            });
            let index = mesh.vertices.len() as u32;
            mesh.vertices.push(Vertex {
                pos: pos.to_array(),
                normal: normal.to_array(),
                // OBJ puts v=0 at the bottom of the image
                uv: [uv.x, 1.0 - uv.y],
            });
            lookup.insert(*corner, index);
            mesh.indices.push(index);
        }

        if missing_normals {
            mesh.compute_normals();
        }
        Ok(mesh)
    }

    fn compute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(self.vertices[a].pos);
            let p1 = Vec3::from(self.vertices[b].pos);
            let p2 = Vec3::from(self.vertices[c].pos);
            let n = (p1 - p0).cross(p2 - p0);
            if n.length_squared() > f32::EPSILON {
                let n = n.normalize();
                accum[a] += n;
                accum[b] += n;
                accum[c] += n;
            }
        }
        for (vertex, n) in self.vertices.iter_mut().zip(accum) {
            if Vec3::from(vertex.normal) == Vec3::ZERO {
                vertex.normal = n.normalize_or_zero().to_array();
            }
        }
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertex buffer")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} index buffer")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// 1-based (or negative, relative) OBJ indices; 0 means absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FaceIndex {
    v: i32,
    vt: i32,
    vn: i32,
}

fn parse_floats<'a, const N: usize>(mut parts: impl Iterator<Item = &'a str>) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for slot in out.iter_mut() {
        *slot = parts
            .next()
            .ok_or_else(|| anyhow!("missing component"))?
            .parse::<f32>()?;
    }
    Ok(out)
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>> {
    let mut corners = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or_else(|| anyhow!("missing vertex index"))?
            .parse::<i32>()?;
        let mut optional = || -> Result<i32> {
            match segments.next() {
                Some(s) if !s.is_empty() => Ok(s.parse::<i32>()?),
                _ => Ok(0),
            }
        };
        let vt = optional()?;
        let vn = optional()?;
        corners.push(FaceIndex { v, vt, vn });
    }
    if corners.len() < 3 {
        return Err(anyhow!("faces must reference at least 3 vertices"));
    }
    Ok(corners)
}

fn resolve<T: Copy>(index: i32, items: &[T]) -> Option<T> {
    let i = if index > 0 {
        index as usize - 1
    } else if index < 0 {
        items.len().checked_sub(index.unsigned_abs() as usize)?
    } else {
        return None;
    };
    items.get(i).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_outward_flat_faces() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for tri in cube.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri.iter().map(|&i| Vec3::from(cube.vertices[i as usize].pos)).collect();
            let face_normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize();
            let stored = Vec3::from(cube.vertices[tri[0] as usize].normal);
            // counter-clockwise winding seen from outside
            assert!((face_normal - stored).length() < 1e-5);
        }
    }

    #[test]
    fn parses_textured_quad() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";
        let mesh = Mesh::from_obj_str(obj).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(mesh.vertices[2].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn computes_missing_normals() {
        let mesh = Mesh::from_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        for v in &mesh.vertices {
            assert!((Vec3::from(v.normal) - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn negative_indices_are_relative() {
        let mesh = Mesh::from_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(mesh.vertices[0].pos, [0.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2].pos, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn reports_bad_lines() {
        let err = Mesh::from_obj_str("v 0 0 0\nv 1 zero 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        assert!(Mesh::from_obj_str("# nothing here\n").is_err());
        assert!(Mesh::from_obj_str("v 0 0 0\nf 1 2 9\n").is_err());
    }
}
