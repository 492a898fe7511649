use chromaplay::{
    FilterCatalog, FrameRgba, Intent, IterationOutcome, ManualScheduler, PixelSurface,
    PlaybackController, Player, SimulatedMedia, SimulatedMediaOpts, SkipReason, VideoCatalog,
};

const PX: [u8; 4] = [200, 100, 50, 180];

fn player(width: u32, height: u32) -> Player<SimulatedMedia, ManualScheduler, PixelSurface> {
    let c = PlaybackController::new(VideoCatalog::builtin(), FilterCatalog::builtin());
    Player::new(c, ManualScheduler::new(), PixelSurface::new(width, height))
}

fn still_media() -> SimulatedMedia {
    let frame = FrameRgba::solid(8, 8, PX).unwrap();
    SimulatedMedia::with_still_frame(SimulatedMediaOpts::default(), frame)
}

fn surface_pixel(p: &Player<SimulatedMedia, ManualScheduler, PixelSurface>) -> [u8; 4] {
    p.surface().to_frame().pixel(0, 0).unwrap()
}

#[test]
fn filter_change_applies_on_next_refresh() {
    let mut p = player(8, 8);
    p.mount(still_media());
    p.step(0.016);
    assert_eq!(surface_pixel(&p), PX);

    p.dispatch(Intent::SelectFilter { index: 1 });
    // Nothing is recomputed until the loop runs again.
    assert_eq!(surface_pixel(&p), PX);

    p.step(0.016);
    assert_eq!(surface_pixel(&p), [0, 100, 0, 180]);

    p.dispatch(Intent::SelectFilter { index: 4 });
    p.step(0.016);
    assert_eq!(surface_pixel(&p), [117, 117, 117, 180]);
}

#[test]
fn loop_runs_every_refresh_while_mounted() {
    let mut p = player(8, 8);
    p.mount(still_media());
    for _ in 0..30 {
        assert_eq!(p.step(0.016).len(), 1);
    }
    let stats = p.frame_loop_stats();
    assert_eq!(stats.iterations, 30);
    assert_eq!(stats.rendered, 30);
    assert_eq!(p.scheduler().pending().len(), 1);
}

#[test]
fn zero_area_surface_skips_but_keeps_scheduling() {
    let mut p = player(0, 0);
    p.mount(still_media());
    for _ in 0..5 {
        assert_eq!(
            p.step(0.016),
            vec![IterationOutcome::Skipped(SkipReason::ZeroAreaSurface)]
        );
    }

    p.surface_mut().resize(4, 4);
    assert_eq!(p.step(0.016), vec![IterationOutcome::Rendered]);
}

#[test]
fn video_switch_leaves_a_single_loop() {
    let mut p = player(8, 8);
    p.mount(still_media());
    p.step(0.016);
    for i in 0..10 {
        p.dispatch(Intent::SelectVideo { index: i });
        p.dispatch(Intent::SelectFilter { index: i % 5 });
    }
    assert_eq!(p.scheduler().pending().len(), 1);
    assert_eq!(p.step(0.016).len(), 1);
    assert_eq!(p.snapshot().state.current_video_index, 9 % VideoCatalog::builtin().len());
}

#[test]
fn callbacks_after_unmount_have_no_effect() {
    let mut p = player(8, 8);
    p.mount(still_media());
    p.step(0.016);
    let stale = p.scheduler().pending().to_vec();
    let commits = p.surface().commits();

    let media = p.unmount().unwrap();
    assert!(media.source_url().is_none());
    assert!(p.fire(stale).is_empty());
    assert!(p.step(0.016).is_empty());
    assert_eq!(p.surface().commits(), commits);
    assert_eq!(p.frame_loop_stats().stale_callbacks, 1);

    p.dispatch(Intent::PlayPause);
    assert!(!p.snapshot().state.is_playing);
}

#[test]
fn remount_restarts_loop_and_source() {
    let mut p = player(8, 8);
    p.mount(still_media());
    p.step(0.016);
    let media = p.unmount().unwrap();

    p.mount(media);
    assert!(p.is_mounted());
    assert_eq!(p.step(0.016), vec![IterationOutcome::Rendered]);
}

#[test]
fn auto_advance_restarts_capture_for_next_video() {
    let opts = SimulatedMediaOpts {
        default_duration_secs: 0.05,
        ..SimulatedMediaOpts::default()
    };
    let mut p = player(8, 8);
    p.mount(SimulatedMedia::new(opts));
    p.step(0.016);
    p.dispatch(Intent::PlayPause);

    let mut switched = false;
    for _ in 0..10 {
        p.step(0.016);
        if p.snapshot().state.current_video_index == 1 {
            switched = true;
            break;
        }
    }
    assert!(switched);
    assert!(p.frame_loop_stats().restarts >= 1);
    assert_eq!(p.scheduler().pending().len(), 1);
}

#[test]
fn ui_intents_reach_the_controller() {
    let mut p = player(8, 8);
    p.mount(still_media());
    p.step(0.016);

    p.dispatch(Intent::SetVolume { value: 0.7 });
    p.dispatch(Intent::ToggleMute);
    p.dispatch(Intent::Seek { seconds: 3.0 });
    p.dispatch(Intent::PlayPause);

    let s = p.snapshot().state;
    assert_eq!(s.volume, 0.7);
    assert!(s.is_muted);
    assert_eq!(s.current_time_seconds, 3.0);
    assert!(s.is_playing);
}
