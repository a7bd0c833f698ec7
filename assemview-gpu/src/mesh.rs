//! GPU mesh rendering with a normal-colored material
//!
//! Each visible scene mesh gets its own vertex buffer (flat-shaded, one
//! vertex per triangle corner) and model uniform. Buffers are cached per
//! [`SceneNodeId`]; scene meshes never change once attached, so only the
//! model matrix is rewritten each frame.

use std::collections::HashMap;

use assemview_core::{DrawItem, SceneNodeId, TriangleMesh};
use bytemuck::{Pod, Zeroable};
use nalgebra::Matrix4;
use wgpu::util::DeviceExt;

/// Vertex data for mesh rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Expand a mesh into flat-shaded vertices, three per face, each carrying
/// its face normal
pub fn mesh_to_vertices(mesh: &TriangleMesh) -> Vec<MeshVertex> {
    mesh.triangles()
        .zip(mesh.calculate_face_normals())
        .flat_map(|(corners, n)| {
            corners.map(|p| MeshVertex {
                position: [p.x, p.y, p.z],
                normal: [n.x, n.y, n.z],
            })
        })
        .collect()
}

/// Camera uniform data
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view: &Matrix4<f32>, projection: &Matrix4<f32>) -> Self {
        Self {
            view_proj: (projection * view).into(),
            view: (*view).into(),
        }
    }
}

/// Per-mesh uniform: model matrix and the matrix that carries normals
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(model: &Matrix4<f32>) -> Self {
        let normal = model
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: (*model).into(),
            normal: normal.into(),
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
}

/// Draws the visible meshes of a scene graph
pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    meshes: HashMap<SceneNodeId, GpuMesh>,
    frame: Vec<SceneNodeId>,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let uniform_layout_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_bind_group_layout"),
            entries: &[uniform_layout_entry],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model_bind_group_layout"),
            entries: &[uniform_layout_entry],
        });

        let camera_uniform = CameraUniform::new(&Matrix4::identity(), &Matrix4::identity());
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::bytes_of(&camera_uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Normal Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh_normal.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Render Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &model_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[MeshVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        Self {
            pipeline,
            camera_buffer,
            camera_bind_group,
            model_layout,
            meshes: HashMap::new(),
            frame: Vec::new(),
        }
    }

    /// Upload the camera matrices
    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    /// Upload whatever `items` needs and remember them as this frame's draw
    /// list
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[DrawItem]) {
        self.frame.clear();
        for item in items {
            let uniform = ModelUniform::new(&item.world.matrix);
            match self.meshes.get(&item.id) {
                Some(gpu_mesh) => {
                    queue.write_buffer(&gpu_mesh.model_buffer, 0, bytemuck::bytes_of(&uniform));
                }
                None => {
                    let gpu_mesh = self.upload(device, &item.mesh, &uniform);
                    log::debug!("Uploaded {} ({} vertices)", item.id, gpu_mesh.vertex_count);
                    self.meshes.insert(item.id, gpu_mesh);
                }
            }
            self.frame.push(item.id);
        }
    }

    fn upload(
        &self,
        device: &wgpu::Device,
        mesh: &TriangleMesh,
        uniform: &ModelUniform,
    ) -> GpuMesh {
        let vertices = mesh_to_vertices(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Buffer"),
            contents: bytemuck::bytes_of(uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model_bind_group"),
            layout: &self.model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buffer.as_entire_binding(),
            }],
        });
        GpuMesh {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            model_buffer,
            model_bind_group,
        }
    }

    /// Record draw calls for the prepared frame
    pub fn draw<'rp>(&'rp self, pass: &mut wgpu::RenderPass<'rp>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for id in &self.frame {
            let Some(gpu_mesh) = self.meshes.get(id) else {
                continue;
            };
            if gpu_mesh.vertex_count == 0 {
                continue;
            }
            pass.set_bind_group(1, &gpu_mesh.model_bind_group, &[]);
            pass.set_vertex_buffer(0, gpu_mesh.vertex_buffer.slice(..));
            pass.draw(0..gpu_mesh.vertex_count, 0..1);
        }
    }

    /// Drop every cached buffer, e.g. when a new assembly replaces the scene
    pub fn clear(&mut self) {
        self.meshes.clear();
        self.frame.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use assemview_core::{Point3f, Vector3f};
    use nalgebra::Vector3;

    #[test]
    fn test_vertices_are_flat_shaded() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 1, 2], [0, 3, 1]],
        );
        let vertices = mesh_to_vertices(&mesh);
        assert_eq!(vertices.len(), 6);
        assert!(vertices[..3].iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert!(vertices[3..].iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        assert_eq!(vertices[4].position, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_model_uniform_normal_matrix_ignores_translation() {
        let model = Matrix4::new_translation(&Vector3f::new(3.0, 0.0, 0.0))
            * Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));
        let uniform = ModelUniform::new(&model);
        let normal = Matrix4::from(uniform.normal);

        let n: Vector3f = normal.fixed_view::<3, 3>(0, 0) * Vector3f::new(1.0, 0.0, 0.0);
        assert_relative_eq!(n, Vector3f::new(0.5, 0.0, 0.0));
        assert_relative_eq!(Matrix4::from(uniform.model), model);
    }

    #[test]
    fn test_singular_model_falls_back_to_identity_normals() {
        let uniform = ModelUniform::new(&Matrix4::zeros());
        assert_eq!(Matrix4::from(uniform.normal), Matrix4::<f32>::identity());
    }

    #[test]
    fn test_camera_uniform_combines_projection_and_view() {
        let view = Matrix4::new_translation(&Vector3f::new(0.0, 0.0, -15.0));
        let projection = Matrix4::new_scaling(2.0);
        let uniform = CameraUniform::new(&view, &projection);
        assert_relative_eq!(Matrix4::from(uniform.view_proj), projection * view);
        assert_relative_eq!(Matrix4::from(uniform.view), view);
    }
}
