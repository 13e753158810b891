#![no_main]

use libfuzzer_sys::fuzz_target;
use medialist::{MediaEntry, PersistedPlaylist, PlayMode, PlaylistCore};
use std::path::Path;

const KEYWORDS: [&str; 4] = ["", "track_1", "TRACK", "zzz"];

fuzz_target!(|data: &[u8]| {
    let len = data.first().map_or(1, |b| usize::from(*b) % 32);
    let entries = (0..len)
        .map(|idx| MediaEntry::from_path(Path::new(&format!("/fuzz/track_{idx}.mp3"))))
        .collect();
    let mut core = PlaylistCore::from_persisted(PersistedPlaylist {
        entries,
        current_index: Some(0),
        mode: PlayMode::Sequential,
    });

    for pair in data.chunks(2) {
        let op = pair[0];
        let arg = usize::from(pair.get(1).copied().unwrap_or(0));
        match op % 12 {
            0 => core.set_mode(PlayMode::ALL[arg % PlayMode::ALL.len()]),
            1 => core.cycle_mode(),
            2 => {
                let _ = core.advance();
            }
            3 => {
                let _ = core.step_back();
            }
            4 => {
                core.remove_at(arg % 40);
            }
            5 => {
                core.move_entry(arg % 40, arg / 7 % 40);
            }
            6 => core.search(KEYWORDS[arg % KEYWORDS.len()]),
            7 => core.show_favorites_only(arg % 2 == 0),
            8 => {
                core.toggle_favorite(arg % 40);
            }
            9 => {
                core.set_current_index(Some(arg % 40));
            }
            10 => {
                core.activate_row(arg % 40);
            }
            _ => {
                let _ = core.persisted();
            }
        }

        if let Some(current) = core.current_index() {
            assert!(current < core.len());
        }
        if core.mode() == PlayMode::Random && !core.is_filtered() {
            assert_eq!(core.shuffle_order().len(), core.len());
        }
    }
});
