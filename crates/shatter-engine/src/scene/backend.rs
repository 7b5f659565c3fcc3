use anyhow::{Context, Result};
use winit::window::Window;

use crate::device::{Gpu, GpuFrame};
use crate::frame::SceneBackend;
use crate::picking::TargetTexel;

use super::layout::{CommonUniform, InstanceTransform, PostUniform};
use super::registry::{GpuScene, PRIMARY_INSTANCES};

/// Records the scene passes of one frame with wgpu.
///
/// The surface texture is acquired in `begin_frame` and presented in
/// `end_frame`; dropping the backend in between discards the frame.
pub struct GpuBackend<'a, 'w> {
    gpu: &'a mut Gpu<'w>,
    scene: &'a GpuScene,
    window: Option<&'a Window>,
    frame: Option<GpuFrame>,
}

impl<'a, 'w> GpuBackend<'a, 'w> {
    pub fn new(gpu: &'a mut Gpu<'w>, scene: &'a GpuScene, window: Option<&'a Window>) -> Self {
        Self {
            gpu,
            scene,
            window,
            frame: None,
        }
    }

    fn frame_mut(&mut self) -> Result<&mut GpuFrame> {
        self.frame.as_mut().context("no frame in progress")
    }
}

impl SceneBackend for GpuBackend<'_, '_> {
    fn begin_frame(&mut self) -> Result<()> {
        anyhow::ensure!(self.frame.is_none(), "frame already in progress");
        let mut frame = self.gpu.acquire_frame()?;
        let scene = self.scene;

        {
            let _clear = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shatter clear"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &scene.color_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &scene.pick_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &scene.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.frame = Some(frame);
        Ok(())
    }

    fn write_common(&mut self, block: &CommonUniform) {
        self.gpu
            .queue()
            .write_buffer(&self.scene.common_ubo, 0, bytemuck::bytes_of(block));
    }

    fn draw_primary(&mut self) -> Result<()> {
        let scene = self.scene;
        let frame = self.frame_mut()?;

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shatter primary pass"),
            color_attachments: &[Some(load_attachment(&scene.color_view))],
            depth_stencil_attachment: Some(load_depth(&scene.depth_view)),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&scene.primary_pipeline);
        rpass.set_bind_group(0, &scene.common_bind_group, &[]);
        rpass.set_vertex_buffer(0, scene.tube_vbo.slice(..));
        rpass.draw(0..scene.tube_vertices, 0..PRIMARY_INSTANCES);
        Ok(())
    }

    fn instance_capacity(&self) -> usize {
        self.scene.instance_capacity
    }

    fn write_instances(&mut self, transforms: &[InstanceTransform]) -> Result<()> {
        anyhow::ensure!(
            transforms.len() <= self.scene.instance_capacity,
            "{} instances do not fit the {}-slot instance buffer",
            transforms.len(),
            self.scene.instance_capacity
        );
        if !transforms.is_empty() {
            self.gpu.queue().write_buffer(
                &self.scene.instance_vbo,
                0,
                bytemuck::cast_slice(transforms),
            );
        }
        Ok(())
    }

    fn draw_instanced(&mut self, count: u32) -> Result<()> {
        let scene = self.scene;
        anyhow::ensure!(
            count as usize <= scene.instance_capacity,
            "cannot draw {count} instances from a {}-slot instance buffer",
            scene.instance_capacity
        );
        let frame = self.frame_mut()?;

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shatter instanced pass"),
            color_attachments: &[
                Some(load_attachment(&scene.color_view)),
                Some(load_attachment(&scene.pick_view)),
            ],
            depth_stencil_attachment: Some(load_depth(&scene.depth_view)),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if count > 0 {
            rpass.set_pipeline(&scene.instanced_pipeline);
            rpass.set_bind_group(0, &scene.common_bind_group, &[]);
            rpass.set_vertex_buffer(0, scene.cube_vbo.slice(..));
            rpass.set_vertex_buffer(1, scene.instance_vbo.slice(..));
            rpass.draw(0..scene.cube_vertices, 0..count);
        }
        Ok(())
    }

    fn write_post(&mut self, post: &PostUniform) {
        self.gpu
            .queue()
            .write_buffer(&self.scene.post_ubo, 0, bytemuck::bytes_of(post));
    }

    fn draw_post(&mut self) -> Result<()> {
        let scene = self.scene;
        let surface = self.gpu.size();
        let frame = self.frame_mut()?;

        let vw = scene.mapping.width.min(surface.width).max(1);
        let vh = scene.mapping.height.min(surface.height).max(1);

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shatter post pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(0.0, 0.0, vw as f32, vh as f32, 0.0, 1.0);
        rpass.set_pipeline(&scene.post_pipeline);
        rpass.set_bind_group(0, &scene.post_bind_group, &[]);
        rpass.draw(0..3, 0..1);
        Ok(())
    }

    fn read_pick(&mut self, texel: TargetTexel) -> Result<i32> {
        let scene = self.scene;
        let (tw, th) = scene.mapping.target_size();
        anyhow::ensure!(
            texel.x < tw && texel.y < th,
            "pick texel ({}, {}) outside {tw}x{th} target",
            texel.x,
            texel.y
        );

        let frame = self.frame.as_mut().context("no frame in progress")?;
        frame.encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &scene.pick_texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: texel.x,
                    y: texel.row_from_top(th),
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &scene.pick_staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        // Everything recorded so far, passes included, goes out with the copy.
        self.gpu.flush(frame);

        let slice = scene.pick_staging.slice(..4);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.gpu.wait_idle()?;
        rx.recv()
            .context("pick readback callback was dropped")?
            .context("failed to map pick readback buffer")?;

        let value = {
            let data = slice.get_mapped_range();
            bytemuck::pod_read_unaligned::<i32>(&data[..4])
        };
        scene.pick_staging.unmap();

        log::trace!("pick texel ({}, {}) = {value}", texel.x, texel.y);
        Ok(value)
    }

    fn end_frame(&mut self) -> Result<()> {
        let frame = self.frame.take().context("no frame in progress")?;
        if let Some(window) = self.window {
            window.pre_present_notify();
        }
        self.gpu.submit(frame);
        Ok(())
    }
}

fn load_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Load,
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    }
}

fn load_depth(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Load,
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}
