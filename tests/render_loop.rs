//! Integration tests for the frame loop.
//!
//! A recording backend logs every call the loop makes so the tests can check
//! ordering: uploads, releases, resizes and draws.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chromatic_vortex::prelude::*;
use chromatic_vortex::render_loop::{FrameInput, LoopState};
use chromatic_vortex::time::FramePacer;
use chromatic_vortex::viewport::ViewportManager;

// ============================================================================
// Recording backend
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Upload(usize),
    Resize(u32, u32),
    Draw {
        time: f32,
        count: usize,
        constant: MathConstant,
        params: ContinuousParams,
    },
    Release,
}

#[derive(Default, Clone)]
struct Recorder {
    log: Rc<RefCell<Vec<Event>>>,
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    fn draws(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Draw { .. }))
            .collect()
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.log.borrow().iter().filter(|e| pred(e)).count()
    }
}

impl FieldBackend for Recorder {
    type Error = Infallible;

    fn upload(&mut self, field: &ParticleField) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Event::Upload(field.len()));
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) {
        self.log
            .borrow_mut()
            .push(Event::Resize(viewport.width, viewport.height));
    }

    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Event::Draw {
            time: frame.time,
            count: frame.field.len(),
            constant: frame.constant,
            params: frame.params,
        });
        Ok(())
    }

    fn release(&mut self) {
        self.log.borrow_mut().push(Event::Release);
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn channel(count: u32) -> ParameterChannel {
    let mut channel = ParameterChannel::default();
    channel.set_particle_count(count);
    channel
}

fn running(recorder: &Recorder, ch: &ParameterChannel, t0: Instant) -> RenderLoop<Recorder> {
    let mut rl = RenderLoop::new(recorder.clone(), Viewport::new(640, 480, 1.0)).with_jitter(Jitter::Seeded(3));
    rl.start(ch, t0).ok();
    rl
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_mount_uploads_then_sizes() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(100);
    let rl = running(&rec, &ch, t0);

    assert_eq!(rl.state(), LoopState::Running);
    assert_eq!(rec.events(), vec![Event::Upload(100), Event::Resize(640, 480)]);
}

#[test]
fn test_frame_before_start_is_inactive() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let mut rl = RenderLoop::new(rec.clone(), Viewport::new(64, 64, 1.0));

    assert_eq!(rl.frame(&ch, t0).ok(), Some(FrameOutcome::Inactive));
    assert!(rec.events().is_empty());
}

#[test]
fn test_first_frame_draws_at_time_zero() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(50);
    let mut rl = running(&rec, &ch, t0);

    assert_eq!(rl.frame(&ch, t0).ok(), Some(FrameOutcome::Drawn { time: 0.0 }));
    assert_eq!(rl.frames_drawn(), 1);
}

#[test]
fn test_dispose_twice_releases_once() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let mut rl = running(&rec, &ch, t0);
    rec.clear();

    rl.dispose();
    rl.dispose();

    assert_eq!(rec.events(), vec![Event::Release]);
    assert_eq!(rl.state(), LoopState::Disposed);
}

#[test]
fn test_disposed_loop_is_silent() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let mut rl = running(&rec, &ch, t0);
    rl.dispose();
    rec.clear();

    rl.notify_resize(100, 100, 1.0, t0);
    rl.toggle_pause(t0);
    assert_eq!(rl.frame(&ch, t0 + ms(500)).ok(), Some(FrameOutcome::Inactive));
    rl.start(&ch, t0 + ms(600)).ok();

    assert!(rec.events().is_empty());
    assert_eq!(rl.next_deadline(), None);
}

#[test]
fn test_drop_disposes() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    {
        let _rl = running(&rec, &ch, t0);
    }
    assert_eq!(rec.count(|e| *e == Event::Release), 1);
}

#[test]
fn test_zero_count_draws_empty_field() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(0);
    let mut rl = running(&rec, &ch, t0);

    assert!(matches!(rl.frame(&ch, t0).ok(), Some(FrameOutcome::Drawn { .. })));
    assert!(matches!(rec.draws()[0], Event::Draw { count: 0, .. }));
}

// ============================================================================
// Parameters
// ============================================================================

#[test]
fn test_continuous_update_reaches_next_frame_without_rebuild() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let mut ch = channel(100);
    let mut rl = running(&rec, &ch, t0);
    rl.frame(&ch, t0).ok();

    ch.set_rotation_speed(2.5);
    ch.set_opacity(0.3);
    rl.frame(&ch, t0 + ms(20)).ok();

    let draws = rec.draws();
    let Some(Event::Draw { params, .. }) = draws.last() else {
        panic!("no draw recorded");
    };
    assert_eq!(params.rotation_speed, 2.5);
    assert!((params.particle_opacity - 0.3).abs() < 1e-6);
    assert_eq!(rec.count(|e| matches!(e, Event::Upload(_))), 1);
    assert_eq!(rl.builds(), 1);
}

#[test]
fn test_out_of_range_updates_are_clamped() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let mut ch = channel(10);
    let mut rl = running(&rec, &ch, t0);

    ch.set_breathe_speed(99.0);
    ch.set_spiral_tightness(0.0);
    rl.frame(&ch, t0).ok();

    let Some(Event::Draw { params, .. }) = rec.draws().pop() else {
        panic!("no draw recorded");
    };
    assert_eq!(params.breathe_speed, 3.0);
    assert!((params.spiral_tightness - 0.1).abs() < 1e-6);
}

#[test]
fn test_constant_change_rebuilds_in_order() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let mut ch = channel(30);
    let mut rl = running(&rec, &ch, t0);
    rl.frame(&ch, t0).ok();
    rec.clear();

    ch.set_constant(MathConstant::Pi);
    let outcome = rl.frame(&ch, t0 + ms(1_000)).ok();

    assert_eq!(outcome, Some(FrameOutcome::Drawn { time: 0.0 }));
    let events = rec.events();
    assert_eq!(events[0], Event::Release);
    assert_eq!(events[1], Event::Upload(30));
    assert!(matches!(
        events.last(),
        Some(Event::Draw {
            constant: MathConstant::Pi,
            count: 30,
            ..
        })
    ));
    assert_eq!(rl.builds(), 2);
}

#[test]
fn test_count_change_rebuilds_once() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let mut ch = channel(10);
    let mut rl = running(&rec, &ch, t0);

    ch.set_particle_count(40);
    rl.frame(&ch, t0 + ms(20)).ok();
    rl.frame(&ch, t0 + ms(40)).ok();
    rl.frame(&ch, t0 + ms(60)).ok();

    assert_eq!(rec.count(|e| matches!(e, Event::Upload(_))), 2);
    assert_eq!(rec.count(|e| *e == Event::Release), 1);
    assert_eq!(rl.field().map(|f| f.len()), Some(40));
}

#[test]
fn test_unchanged_structural_write_does_not_rebuild() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let mut ch = channel(10);
    let mut rl = running(&rec, &ch, t0);

    assert!(!ch.set_constant(MathConstant::GoldenRatio));
    rl.frame(&ch, t0 + ms(20)).ok();
    assert_eq!(rl.builds(), 1);
}

// ============================================================================
// Time and pacing
// ============================================================================

#[test]
fn test_time_never_decreases() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let mut rl = running(&rec, &ch, t0);

    let mut last = -1.0f32;
    for step in [0u64, 17, 40, 33, 90, 90, 200] {
        if let Ok(FrameOutcome::Drawn { time }) = rl.frame(&ch, t0 + ms(step)) {
            assert!(time >= last, "time went from {} to {}", last, time);
            last = time;
        }
    }
    assert!(last > 0.0);
}

#[test]
fn test_pacer_caps_frame_rate() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let mut rl = RenderLoop::new(rec.clone(), Viewport::new(64, 64, 1.0)).with_pacer(FramePacer::new(10));
    rl.start(&ch, t0).ok();

    for step in 0..100u64 {
        rl.frame(&ch, t0 + ms(step * 10)).ok();
    }
    // one second at 10 fps, plus the first frame
    let drawn = rec.draws().len();
    assert!((10..=11).contains(&drawn), "drew {} frames", drawn);
}

#[test]
fn test_pause_freezes_time() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let mut rl = running(&rec, &ch, t0);
    rl.frame(&ch, t0).ok();

    rl.frame(&ch, t0 + ms(500)).ok();
    rl.toggle_pause(t0 + ms(500));
    rl.frame(&ch, t0 + ms(1_000)).ok();
    rl.frame(&ch, t0 + ms(1_500)).ok();

    let times: Vec<f32> = rec
        .draws()
        .into_iter()
        .filter_map(|e| match e {
            Event::Draw { time, .. } => Some(time),
            _ => None,
        })
        .collect();
    assert_eq!(times.len(), 4);
    assert!((times[1] - 0.5).abs() < 1e-3);
    assert_eq!(times[2], times[1]);
    assert_eq!(times[3], times[1]);

    rl.toggle_pause(t0 + ms(1_500));
    if let Ok(FrameOutcome::Drawn { time }) = rl.frame(&ch, t0 + ms(1_600)) {
        assert!((time - 0.6).abs() < 1e-3);
    } else {
        panic!("expected a frame after resuming");
    }
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_burst_applies_once() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let mut rl = running(&rec, &ch, t0);
    rec.clear();

    for i in 0..5u64 {
        rl.notify_resize(700 + i as u32 * 20, 500, 1.0, t0 + ms(i * 10));
        rl.frame(&ch, t0 + ms(i * 10)).ok();
    }
    assert_eq!(rec.count(|e| matches!(e, Event::Resize(..))), 0);

    for step in 0..20u64 {
        rl.frame(&ch, t0 + ms(50 + step * 10)).ok();
    }

    let resizes: Vec<Event> = rec
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Resize(..)))
        .collect();
    assert_eq!(resizes, vec![Event::Resize(780, 500)]);
    assert_eq!(rl.viewport().width, 780);
}

#[test]
fn test_resize_respects_custom_debounce() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let viewport = Viewport::new(640, 480, 1.0);
    let mut rl = RenderLoop::new(rec.clone(), viewport)
        .with_viewport_manager(ViewportManager::with_debounce(viewport, ms(250)));
    rl.start(&ch, t0).ok();
    rec.clear();

    rl.notify_resize(320, 240, 1.0, t0);
    assert_eq!(rl.next_deadline().map(|d| d <= t0 + ms(250)), Some(true));
    rl.frame(&ch, t0 + ms(200)).ok();
    assert_eq!(rec.count(|e| matches!(e, Event::Resize(..))), 0);
    rl.frame(&ch, t0 + ms(250)).ok();
    assert_eq!(rec.count(|e| *e == Event::Resize(320, 240)), 1);
}

#[test]
fn test_dense_display_is_capped() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let mut rl = running(&rec, &ch, t0);

    rl.notify_resize(3000, 1500, 3.0, t0);
    rl.frame(&ch, t0 + ms(150)).ok();

    let viewport = rl.viewport();
    assert_eq!(viewport.pixel_ratio, 2.0);
    assert_eq!((viewport.width, viewport.height), (2000, 1000));
}

#[test]
fn test_dispose_mid_debounce_drops_resize() {
    let t0 = Instant::now();
    let rec = Recorder::default();
    let ch = channel(10);
    let mut rl = running(&rec, &ch, t0);
    rec.clear();

    rl.notify_resize(100, 100, 1.0, t0);
    rl.dispose();
    rl.frame(&ch, t0 + ms(500)).ok();

    assert_eq!(rec.events(), vec![Event::Release]);
}
