//! Property tests over the pool, the draw order and the fade.

use proptest::prelude::*;
use pyre::prelude::*;
use pyre::{integrate, DepthCompositor, ParticlePool, SpawnContext};

proptest! {
    #[test]
    fn test_pool_never_exceeds_capacity(
        capacity in 1usize..64,
        ops in prop::collection::vec(any::<bool>(), 0..256),
    ) {
        let mut pool = ParticlePool::new(capacity);
        let mut live = Vec::new();

        for allocate in ops {
            if allocate {
                match pool.allocate() {
                    Ok(slot) => live.push(slot),
                    Err(e) => {
                        prop_assert_eq!(e.capacity, capacity);
                        prop_assert_eq!(pool.active_count(), capacity);
                    }
                }
            } else if let Some(slot) = live.pop() {
                pool.release(slot);
                // A second release is a no-op.
                pool.release(slot);
            }
            prop_assert!(pool.active_count() <= capacity);
            prop_assert_eq!(pool.active_count(), live.len());
            prop_assert_eq!(pool.active_count() + pool.free_count(), capacity);
        }
    }

    #[test]
    fn test_burst_spawns_plus_drops_equal_request(
        capacity in 1usize..200,
        prefill in 0usize..200,
        count in 0u32..400,
        seed in any::<u64>(),
    ) {
        let mut pool = ParticlePool::new(capacity);
        for _ in 0..prefill.min(capacity) {
            pool.allocate().unwrap();
        }
        let free = pool.free_count();
        let mut rng = SpawnContext::new(seed);

        let report = pyre::spawn_burst(
            &Burst::new(Vec3::ZERO, count, ParticleKind::Fire),
            &mut pool,
            &mut rng,
        );

        prop_assert_eq!(report.spawned + report.dropped, count as usize);
        prop_assert_eq!(report.spawned, free.min(count as usize));
        prop_assert!(pool.active_count() <= capacity);
    }

    #[test]
    fn test_draw_order_is_non_increasing_depth(
        seed in any::<u64>(),
        ticks in 1usize..30,
        flat in any::<bool>(),
    ) {
        let (projector, fade) = if flat {
            (Projector::Flat(FlatView::new().with_depth_scale(0.6)), FadeConfig::flat())
        } else {
            let camera = Camera::new(Vec2::new(400.0, 300.0));
            (Projector::Perspective(camera), FadeConfig::perspective())
        };
        let config = SimConfig::new(800.0, 600.0)
            .with_capacity(500)
            .with_seed(seed)
            .with_fade(fade);
        let mut sim = Simulation::new(config)
            .with_projector(projector)
            .with_burst(BurstConfig::new(ParticleKind::Ember, 400));
        sim.trigger(Trigger::Burst {
            at: Vec2::new(400.0, 300.0),
        });
        for _ in 0..ticks {
            sim.tick();
        }

        let mut compositor = DepthCompositor::new(fade);
        let items = compositor.compose(sim.pool(), sim.projector(), sim.time());

        for pair in items.windows(2) {
            prop_assert!(pair[0].depth >= pair[1].depth);
        }
        for item in items {
            prop_assert!((0.0..=1.0).contains(&item.fade));
        }
    }

    #[test]
    fn test_depth_factor_respects_floor(
        depth in -10_000.0f32..10_000.0,
        floor in 0.0f32..1.0,
    ) {
        let fade = FadeConfig {
            floor,
            ..FadeConfig::perspective()
        };
        let factor = fade.depth_factor(depth);
        prop_assert!(factor >= floor);
        prop_assert!(factor <= 1.0);
    }

    #[test]
    fn test_released_particles_leave_the_pool(
        lifespan in 1u32..20,
        ticks in 0u64..40,
    ) {
        let mut pool = ParticlePool::new(1);
        pool.spawn(pyre::Particle {
            lifespan,
            ..pyre::Particle::default()
        })
        .unwrap();

        for tick in 0..ticks {
            integrate(&mut pool, &Bounds::unbounded(), tick);
        }

        let alive = ticks < u64::from(lifespan);
        prop_assert_eq!(pool.active_count(), usize::from(alive));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_live_particles_are_younger_than_their_lifespan(
        show in prop::sample::select(Show::ALL.to_vec()),
        seed in any::<u64>(),
        ticks in 1usize..150,
        burst_every in 5usize..40,
    ) {
        let mut sim = show.simulation(seed);
        for tick in 0..ticks {
            for (slot, p) in sim.pool().iter_active() {
                prop_assert!(
                    p.age < p.lifespan,
                    "{} tick {}: slot {:?} age {} lifespan {}",
                    show, tick, slot, p.age, p.lifespan
                );
            }
            if tick % burst_every == 0 {
                sim.trigger(Trigger::SuperBurst);
            }
            sim.tick();
        }
    }

    #[test]
    fn test_batch_quads_are_far_to_near(
        depths in prop::collection::vec(-3.0f32..3.0, 1..64),
    ) {
        // Each particle sits in its own column, so a quad's centre tells which one it is.
        let mut pool = ParticlePool::new(depths.len());
        for (i, z) in depths.iter().enumerate() {
            let kind = if i % 2 == 0 { ParticleKind::Fire } else { ParticleKind::Smoke };
            pool.spawn(pyre::Particle {
                position: Vec3::new(10.0 * (i + 1) as f32, 300.0, *z),
                age: 50,
                lifespan: 100,
                kind,
                ..pyre::Particle::default()
            })
            .unwrap();
        }

        let projector = Projector::Flat(FlatView::new().with_depth_scale(0.5));
        let mut compositor = DepthCompositor::new(FadeConfig::flat());
        let items = compositor.compose(&pool, &projector, 0.0);
        let mut builder = BatchBuilder::default();
        let batches = builder.build(items);

        let mut quads = 0;
        for batch in batches {
            let order: Vec<f32> = batch
                .vertices
                .chunks(4)
                .map(|quad| {
                    let x = quad.iter().map(|v| v.position[0]).sum::<f32>() / 4.0;
                    depths[(x / 10.0).round() as usize - 1]
                })
                .collect();
            quads += order.len();
            for pair in order.windows(2) {
                prop_assert!(pair[0] >= pair[1], "{:?}", order);
            }
        }
        prop_assert_eq!(quads, depths.len());
    }
}
