use std::sync::Arc;

use anyhow::Result;
use ash::vk;
use ash::vk::Handle;

use deimos::prelude::*;

use framework::*;

mod framework;

fn textured_scene(pipeline: Arc<GraphicsPipeline>, set: Arc<DescriptorSet>, probe: Arc<ContextProbe>) -> StateGroup {
    let geometry = Geometry::new().command(probe);
    StateGroup::new()
        .state(Arc::new(BindGraphicsPipeline::new(pipeline)))
        .state(bind_sets(vec![set]))
        .child(Arc::new(geometry))
}

#[test]
pub fn compiling_twice_is_idempotent() -> Result<()> {
    init_logging();
    let device = MockDevice::new();
    let pipeline = graphics_pipeline();
    let set = descriptor_set(vec![uniform_descriptor(0), sampler_descriptor(1, 2)]);
    let scene = RenderGraph::new(vk::RenderPass::from_raw(0x42), render_area(640, 480)).child(Arc::new(textured_scene(
        pipeline.clone(),
        set.clone(),
        ContextProbe::new(),
    )));

    let mut traversal = CompileTraversal::new(make_context(&device));
    traversal.compile_scene(&scene)?;
    let first_pipeline = pipeline.handle(vk::RenderPass::from_raw(0x42));
    let first_set = set.handle();
    assert_eq!(device.num_pipelines(), 1);
    assert_eq!(device.num_descriptor_sets(), 1);

    // Same traversal again, and a fresh context sharing the reserved pool.
    traversal.compile_scene(&scene)?;
    let mut context = make_context(&device);
    context.descriptor_pool = traversal.context.descriptor_pool.clone();
    CompileTraversal::new(context).compile(&scene)?;

    assert_eq!(device.num_pipelines(), 1, "pipeline should be compiled once per render pass");
    assert_eq!(device.num_descriptor_sets(), 1, "descriptor set should be allocated once");
    assert_eq!(device.log.lock().unwrap().descriptor_pools.len(), 1);
    assert_eq!(pipeline.handle(vk::RenderPass::from_raw(0x42)), first_pipeline);
    assert_eq!(set.handle(), first_set);
    assert!(first_pipeline.is_some());
    assert!(first_set.is_some());
    Ok(())
}

#[test]
pub fn pipeline_is_compiled_per_render_pass() -> Result<()> {
    let device = MockDevice::new();
    let pipeline = graphics_pipeline();
    let bind = Arc::new(BindGraphicsPipeline::new(pipeline.clone()));
    let shared: Arc<dyn Node> = Arc::new(StateGroup::new().state(bind));
    let scene = Group::new()
        .child(Arc::new(RenderGraph::new(vk::RenderPass::from_raw(1), render_area(64, 64)).child(shared.clone())))
        .child(Arc::new(RenderGraph::new(vk::RenderPass::from_raw(2), render_area(64, 64)).child(shared)));

    CompileTraversal::new(make_context(&device)).compile(&scene)?;

    assert_eq!(device.num_pipelines(), 2);
    assert!(pipeline.handle(vk::RenderPass::from_raw(1)).is_some());
    assert!(pipeline.handle(vk::RenderPass::from_raw(2)).is_some());
    assert_ne!(pipeline.handle(vk::RenderPass::from_raw(1)), pipeline.handle(vk::RenderPass::from_raw(2)));
    Ok(())
}

#[test]
pub fn pipelines_are_destroyed_with_their_owner() -> Result<()> {
    let device = MockDevice::new();
    {
        let pipeline = graphics_pipeline();
        let scene = RenderGraph::new(vk::RenderPass::from_raw(1), render_area(64, 64))
            .child(Arc::new(StateGroup::new().state(Arc::new(BindGraphicsPipeline::new(pipeline)))));
        CompileTraversal::new(make_context(&device)).compile(&scene)?;
    }
    assert_eq!(device.log.lock().unwrap().pipelines_destroyed, 1);
    Ok(())
}

#[test]
pub fn render_graph_restores_context_for_next_sibling() -> Result<()> {
    init_logging();
    let device = MockDevice::new();
    let inside = ContextProbe::new();
    let after = ContextProbe::new();
    let render_graph = RenderGraph::new(vk::RenderPass::from_raw(7), render_area(320, 200))
        .samples(vk::SampleCountFlags::TYPE_4)
        .child(Arc::new(StatePusher))
        .child(inside.clone());
    let scene = Group::new().child(Arc::new(render_graph)).child(after.clone());

    let mut context = make_context(&device);
    context
        .default_pipeline_states
        .push(Arc::new(ViewportState::from_extent(vk::Extent2D {
            width: 1,
            height: 1,
        })));
    let mut traversal = CompileTraversal::new(context);
    let before = traversal.context.save_state();
    traversal.compile(&scene)?;

    let seen_inside = inside.last();
    assert_eq!(seen_inside.default_pipeline_states.len(), 3);
    assert_eq!(seen_inside.override_pipeline_states.len(), 2);

    assert_eq!(after.seen().len(), 1);
    assert_eq!(after.last(), before);
    assert_eq!(traversal.context.save_state(), before);
    Ok(())
}

#[test]
pub fn render_graph_scopes_render_pass_viewport_and_samples() -> Result<()> {
    let device = MockDevice::new();
    let probe = ContextProbe::new();
    let scene = RenderGraph::new(vk::RenderPass::from_raw(9), render_area(800, 600))
        .samples(vk::SampleCountFlags::TYPE_8)
        .child(probe.clone());

    CompileTraversal::new(make_context(&device)).compile(&scene)?;

    let seen = probe.last();
    assert_eq!(seen.render_pass, Some(vk::RenderPass::from_raw(9)));
    assert_eq!(seen.default_pipeline_states.len(), 1);
    assert_eq!(seen.override_pipeline_states.len(), 1);

    let mut info = PipelineStateInfo::default();
    seen.default_pipeline_states[0].apply(&mut info);
    seen.override_pipeline_states[0].apply(&mut info);
    assert_eq!(info.viewports.len(), 1);
    assert_eq!(info.viewports[0].width, 800.0);
    assert_eq!(info.viewports[0].height, 600.0);
    assert_eq!(info.rasterization_samples, vk::SampleCountFlags::TYPE_8);
    Ok(())
}

#[test]
pub fn single_sampled_render_graph_adds_no_override() -> Result<()> {
    let device = MockDevice::new();
    let probe = ContextProbe::new();
    let viewport = Arc::new(ViewportState::from_extent(vk::Extent2D {
        width: 16,
        height: 16,
    }));
    let scene = RenderGraph::new(vk::RenderPass::from_raw(9), render_area(800, 600))
        .camera(Camera::new(viewport.clone()))
        .child(probe.clone());

    CompileTraversal::new(make_context(&device)).compile(&scene)?;

    let seen = probe.last();
    assert!(seen.override_pipeline_states.is_empty());
    assert_eq!(seen.default_pipeline_states.len(), 1);
    let camera_viewport: Arc<dyn PipelineState> = viewport;
    assert_eq!(
        Arc::as_ptr(&seen.default_pipeline_states[0]) as *const (),
        Arc::as_ptr(&camera_viewport) as *const (),
        "camera viewport should be pushed as is"
    );
    Ok(())
}

#[test]
pub fn context_is_restored_when_subgraph_fails() {
    let device = MockDevice::new();
    let after = ContextProbe::new();
    let render_graph = RenderGraph::new(vk::RenderPass::from_raw(3), render_area(32, 32))
        .samples(vk::SampleCountFlags::TYPE_2)
        .child(Arc::new(StatePusher))
        .child(Arc::new(FailingCommand))
        .child(after.clone());

    let mut traversal = CompileTraversal::new(make_context(&device));
    let before = traversal.context.save_state();
    let result = traversal.compile(&render_graph);

    assert!(result.is_err());
    assert_eq!(result.unwrap_err().to_string(), "failing command");
    assert!(after.seen().is_empty(), "traversal should stop at the first failure");
    assert_eq!(traversal.context.save_state(), before);
}

#[test]
pub fn command_graph_without_window_only_forwards() -> Result<()> {
    let device = MockDevice::new();
    let probe = ContextProbe::new();
    let scene = CommandGraph::new().child(probe.clone());

    let mut traversal = CompileTraversal::new(make_context(&device));
    traversal.compile(&scene)?;

    let seen = probe.last();
    assert_eq!(seen.render_pass, None);
    assert!(seen.default_pipeline_states.is_empty());
    assert!(seen.override_pipeline_states.is_empty());
    Ok(())
}

#[test]
pub fn command_graph_with_window_scopes_window_state() -> Result<()> {
    let device = MockDevice::new();
    let window = MockWindow::new(device.clone(), vk::SampleCountFlags::TYPE_4);
    let inside = ContextProbe::new();
    let after = ContextProbe::new();
    let scene = Group::new()
        .child(Arc::new(CommandGraph::for_window(window.clone()).child(Arc::new(StatePusher)).child(inside.clone())))
        .child(after.clone());

    let mut traversal = CompileTraversal::new(make_context(&device));
    traversal.compile(&scene)?;

    let seen = inside.last();
    // The pusher changed the render pass, so only its scoped lists are checked here.
    assert_eq!(seen.default_pipeline_states.len(), 2);
    let mut info = PipelineStateInfo::default();
    seen.default_pipeline_states[0].apply(&mut info);
    assert_eq!(info.viewports[0].width, 1280.0);
    assert_eq!(info.viewports[0].height, 720.0);
    seen.override_pipeline_states[0].apply(&mut info);
    assert_eq!(info.rasterization_samples, vk::SampleCountFlags::TYPE_4);

    let after = after.last();
    assert_eq!(after.render_pass, None);
    assert!(after.default_pipeline_states.is_empty());
    assert!(after.override_pipeline_states.is_empty());
    Ok(())
}

#[test]
pub fn pipeline_state_precedence() -> Result<()> {
    let device = MockDevice::new();
    let pipeline = Arc::new(
        GraphicsPipeline::new(vk::PipelineLayout::from_raw(1), vec![])
            .state(MultisampleState::new(vk::SampleCountFlags::TYPE_2))
            .state(DepthStencilState {
                depth_compare_op: vk::CompareOp::LESS,
                ..Default::default()
            }),
    );
    let scene = RenderGraph::new(vk::RenderPass::from_raw(5), render_area(100, 50))
        .samples(vk::SampleCountFlags::TYPE_4)
        .child(Arc::new(StateGroup::new().state(Arc::new(BindGraphicsPipeline::new(pipeline)))));

    let mut context = make_context(&device);
    context.default_pipeline_states.push(Arc::new(RasterizationState {
        cull_mode: vk::CullModeFlags::NONE,
        ..Default::default()
    }));
    context.default_pipeline_states.push(Arc::new(DepthStencilState {
        depth_compare_op: vk::CompareOp::ALWAYS,
        ..Default::default()
    }));
    CompileTraversal::new(context).compile(&scene)?;

    let log = device.log.lock().unwrap();
    let (render_pass, state) = &log.pipelines[0];
    assert_eq!(*render_pass, vk::RenderPass::from_raw(5));
    // Defaults apply where the pipeline says nothing.
    assert_eq!(state.cull_mode, vk::CullModeFlags::NONE);
    // The pipeline's own state beats the defaults.
    assert_eq!(state.depth_compare_op, vk::CompareOp::LESS);
    // Overrides beat the pipeline's own state.
    assert_eq!(state.rasterization_samples, vk::SampleCountFlags::TYPE_4);
    assert_eq!(state.viewports[0].width, 100.0);
    assert_eq!(state.scissors[0].extent.height, 50);
    Ok(())
}

#[test]
pub fn pipeline_outside_render_pass_fails() {
    let device = MockDevice::new();
    let scene = StateGroup::new().state(Arc::new(BindGraphicsPipeline::new(graphics_pipeline())));

    let result = CompileTraversal::new(make_context(&device)).compile(&scene);
    let error = result.expect_err("compiling a pipeline without render pass should fail");
    assert!(matches!(error.downcast_ref::<Error>(), Some(Error::NoRenderPass)));
    assert_eq!(device.num_pipelines(), 0);
}

#[test]
pub fn descriptor_set_without_pool_fails() {
    let device = MockDevice::new();
    let set = descriptor_set(vec![uniform_descriptor(0)]);
    let scene = StateGroup::new().state(bind_sets(vec![set.clone()]));

    let result = CompileTraversal::new(make_context(&device)).compile(&scene);
    let error = result.expect_err("compiling a descriptor set without pool should fail");
    assert!(matches!(error.downcast_ref::<Error>(), Some(Error::NoDescriptorPool)));
    assert!(set.handle().is_none());
}

#[test]
pub fn compile_scene_reserves_accounted_pool() -> Result<()> {
    let device = MockDevice::new();
    let shared = descriptor_set(vec![uniform_descriptor(0), sampler_descriptor(1, 3)]);
    let other = descriptor_set(vec![uniform_descriptor(0)]);
    let scene = Group::new()
        .child(Arc::new(StateGroup::new().state(bind_sets(vec![shared.clone()]))))
        .child(Arc::new(StateGroup::new().state(bind_sets(vec![shared.clone(), other.clone()]))));

    let mut traversal = CompileTraversal::new(make_context(&device));
    traversal.compile_scene(&scene)?;

    let log = device.log.lock().unwrap();
    assert_eq!(log.descriptor_pools.len(), 1);
    let (max_sets, sizes) = &log.descriptor_pools[0];
    assert_eq!(*max_sets, 2);
    assert_eq!(sizes.len(), 2);
    let count_of = |ty| sizes.iter().find(|size| size.ty == ty).map(|size| size.descriptor_count);
    assert_eq!(count_of(vk::DescriptorType::UNIFORM_BUFFER), Some(2));
    assert_eq!(count_of(vk::DescriptorType::COMBINED_IMAGE_SAMPLER), Some(3));

    assert_eq!(log.descriptor_sets_allocated, 2);
    assert_eq!(log.descriptor_writes.len(), 3);
    assert!(log.descriptor_writes.contains(&(1, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 3)));
    assert!(shared.pool().is_some());
    Ok(())
}

#[test]
pub fn reserve_descriptors_uses_accounted_sizes() -> Result<()> {
    let device = MockDevice::new();
    let scene = Group::new().with_hints(
        ResourceHints::new()
            .descriptor_sets(4)
            .pool_size(vk::DescriptorType::STORAGE_BUFFER, 8),
    );
    let mut stats = CollectDescriptorStats::default();
    scene.accept(&mut stats)?;

    let mut context = make_context(&device);
    let pool = context.reserve_descriptors(&stats)?.expect("pool should be created");
    assert_eq!(pool.max_sets(), 4);
    assert_eq!(pool.sizes().len(), 1);
    assert_eq!(pool.sizes()[0].ty, vk::DescriptorType::STORAGE_BUFFER);
    assert_eq!(pool.sizes()[0].descriptor_count, 8);
    assert_eq!(context.descriptor_pool.as_ref().map(|pool| pool.handle()), Some(pool.handle()));

    // Nothing to reserve for an empty scene.
    let mut empty = CollectDescriptorStats::default();
    Group::new().accept(&mut empty)?;
    assert!(make_context(&device).reserve_descriptors(&empty)?.is_none());
    Ok(())
}

#[test]
pub fn context_from_window() -> Result<()> {
    let device = MockDevice::with_queue_families(vec![vk::QueueFlags::TRANSFER, vk::QueueFlags::GRAPHICS]);
    let window = MockWindow::new(device.clone(), vk::SampleCountFlags::TYPE_4);
    let viewport = Arc::new(ViewportState::from_extent(window.extent));

    let context = CompileContext::from_window(window.as_ref(), Some(viewport), BufferPreferences::default())?;

    assert_eq!(context.render_pass, Some(window.render_pass));
    assert_eq!(context.graphics_queue.map(|queue| queue.family_index()), Some(1));
    assert_eq!(context.command_pool.as_ref().map(|pool| pool.family_index()), Some(1));
    assert_eq!(context.default_pipeline_states.len(), 1);
    assert_eq!(context.override_pipeline_states.len(), 1);
    assert_eq!(context.buffer_preferences.minimum_buffer_size, 16 * 1024 * 1024);
    assert_eq!(device.log.lock().unwrap().command_pools_created, 1);

    drop(context);
    assert_eq!(device.log.lock().unwrap().command_pools_destroyed, 1);
    Ok(())
}

#[test]
pub fn context_from_window_without_graphics_queue_fails() {
    let device = MockDevice::with_queue_families(vec![vk::QueueFlags::COMPUTE]);
    let window = MockWindow::new(device, vk::SampleCountFlags::TYPE_1);

    let result = CompileContext::from_window(window.as_ref(), None, BufferPreferences::default());
    let error = result.expect_err("context creation should fail without graphics queue");
    assert!(matches!(
        error.downcast_ref::<Error>(),
        Some(Error::NoCapableQueue(flags)) if *flags == vk::QueueFlags::GRAPHICS
    ));
}

#[test]
pub fn geometry_compiles_arrays_and_commands() -> Result<()> {
    let device = MockDevice::new();
    let vertices = Arc::new(CountingArray::default());
    let indices = Arc::new(CountingArray::default());
    let draw = ContextProbe::new();
    let geometry = Geometry::new()
        .array(vertices.clone())
        .array(indices.clone())
        .command(draw.clone());

    CompileTraversal::new(make_context(&device)).compile(&geometry)?;

    assert_eq!(vertices.count(), 1);
    assert_eq!(indices.count(), 1);
    assert_eq!(draw.seen().len(), 1);
    Ok(())
}

#[test]
pub fn commands_compile_as_a_unit() -> Result<()> {
    let device = MockDevice::new();
    let first = ContextProbe::new();
    let second = ContextProbe::new();
    let list: Vec<Arc<dyn Command>> = vec![first.clone(), Arc::new(PipelineBarrier::default()), second.clone()];
    let commands = Commands::new(list);

    CompileTraversal::new(make_context(&device)).compile(&Group::new().child(Arc::new(commands)))?;

    assert_eq!(first.seen().len(), 1);
    assert_eq!(second.seen().len(), 1);
    Ok(())
}

#[test]
pub fn shared_subgraph_is_visited_per_path() -> Result<()> {
    let device = MockDevice::new();
    let array = Arc::new(CountingArray::default());
    let shared: Arc<dyn Node> = Arc::new(Geometry::new().array(array.clone()));
    let scene = Group::new()
        .child(shared.clone())
        .child(Arc::new(Lod::new().level(0.5, shared.clone()).level(0.0, shared)));

    CompileTraversal::new(make_context(&device)).compile(&scene)?;

    assert_eq!(array.count(), 3);
    Ok(())
}

#[test]
pub fn paged_lod_compiles_loaded_levels_only() -> Result<()> {
    let device = MockDevice::new();
    let probe = ContextProbe::new();
    let paged = Arc::new(PagedLod::new("tiles/tile_0_0.bin"));
    let scene = Group::new().child(paged.clone());

    CompileTraversal::new(make_context(&device)).compile(&scene)?;
    assert!(probe.seen().is_empty());
    assert!(!paged.is_loaded()?);

    paged.load(0.25, probe.clone())?;
    assert!(paged.is_loaded()?);
    CompileTraversal::new(make_context(&device)).compile(&scene)?;
    assert_eq!(probe.seen().len(), 1);
    assert_eq!(paged.filename(), "tiles/tile_0_0.bin");

    paged.unload()?;
    assert!(!paged.is_loaded()?);
    CompileTraversal::new(make_context(&device)).compile(&scene)?;
    assert_eq!(probe.seen().len(), 1);
    Ok(())
}

fn assert_send_sync<T: Send + Sync + ?Sized>() {}

#[test]
pub fn contexts_compile_a_shared_scene_on_separate_threads() -> Result<()> {
    assert_send_sync::<CompileContext>();
    assert_send_sync::<CompileTraversal>();
    assert_send_sync::<dyn Node>();
    assert_send_sync::<Group>();
    assert_send_sync::<PipelineBarrier>();
    assert_send_sync::<CollectDescriptorStats>();

    let pipeline = graphics_pipeline();
    let scene: Arc<dyn Node> = Arc::new(StateGroup::new().state(Arc::new(BindGraphicsPipeline::new(pipeline.clone()))));
    let threads = (0..2u64)
        .map(|index| {
            let scene = scene.clone();
            std::thread::spawn(move || -> Result<()> {
                let device = MockDevice::new();
                let graph = RenderGraph::new(vk::RenderPass::from_raw(0x7000 + index), render_area(64, 64)).child(scene);
                CompileTraversal::new(make_context(&device)).compile(&graph)
            })
        })
        .collect::<Vec<_>>();
    for thread in threads {
        thread.join().expect("compile thread panicked")?;
    }

    assert!(pipeline.handle(vk::RenderPass::from_raw(0x7000)).is_some());
    assert!(pipeline.handle(vk::RenderPass::from_raw(0x7001)).is_some());
    Ok(())
}
