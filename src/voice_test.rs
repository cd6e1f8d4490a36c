use super::{Program, VoicePool};
use crate::NUM_VOICES;

fn occupy(pool: &mut VoicePool, channel: usize, note: u8) {
    let voice = pool.get_mut(channel).expect("channel");
    voice.note = Some(note);
}

#[test]
fn test_free_channels_in_order() {
    let mut pool = VoicePool::new();
    let (ch, needs_program) = pool.select(Program::Melodic(0));
    assert_eq!(ch, 0);
    assert!(needs_program);

    // still free, same program loaded
    let (ch, needs_program) = pool.select(Program::Melodic(0));
    assert_eq!(ch, 0);
    assert!(!needs_program);

    occupy(&mut pool, 0, 40);
    let (ch, needs_program) = pool.select(Program::Melodic(0));
    assert_eq!(ch, 1);
    assert!(needs_program);
}

#[test]
fn test_program_kinds_differ() {
    let mut pool = VoicePool::new();
    pool.select(Program::Melodic(3));
    let (ch, needs_program) = pool.select(Program::Percussion(3));
    assert_eq!(ch, 0);
    assert!(needs_program);
}

#[test]
fn test_free_channel_preferred_over_older() {
    let mut pool = VoicePool::new();
    for ch in 0..NUM_VOICES {
        let (selected, _) = pool.select(Program::Melodic(1));
        assert_eq!(selected, ch);
        occupy(&mut pool, ch, 50);
    }
    pool.get_mut(6).expect("channel").note = None;
    let (ch, _) = pool.select(Program::Melodic(1));
    assert_eq!(ch, 6);
}

#[test]
fn test_steals_oldest_channel() {
    let mut pool = VoicePool::new();
    for ch in 0..NUM_VOICES {
        pool.select(Program::Melodic(1));
        occupy(&mut pool, ch, 50);
    }
    // channel 0 was claimed first and has survived the most selections
    let (ch, needs_program) = pool.select(Program::Melodic(1));
    assert_eq!(ch, 0);
    assert!(!needs_program);
    assert_eq!(pool.voices()[0].contest, 0);

    let (ch, _) = pool.select(Program::Melodic(2));
    assert_eq!(ch, 1);
}

#[test]
fn test_ties_go_to_lowest_index() {
    let mut pool = VoicePool::new();
    for ch in 0..NUM_VOICES {
        occupy(&mut pool, ch, 60);
    }
    let (ch, _) = pool.select(Program::Melodic(0));
    assert_eq!(ch, 0);
    let (ch, _) = pool.select(Program::Melodic(0));
    assert_eq!(ch, 1);
}

#[test]
fn test_selection_stays_in_range() {
    let mut pool = VoicePool::new();
    for ch in 0..NUM_VOICES {
        occupy(&mut pool, ch, 60);
    }
    for i in 0..100u8 {
        let (ch, _) = pool.select(Program::Melodic(i % 4));
        assert!(ch < NUM_VOICES);
    }
}

#[test]
fn test_any_free_and_reset() {
    let mut pool = VoicePool::new();
    assert!(pool.any_free());
    for ch in 0..NUM_VOICES {
        occupy(&mut pool, ch, 60);
    }
    assert!(!pool.any_free());
    pool.reset();
    assert!(pool.any_free());
    assert!(pool.voices().iter().all(|v| v.program.is_none()));
}
