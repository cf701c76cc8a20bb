//! Whole-file decode/encode tests over hand-assembled SMF byte streams.

use minismf::{
    Division, Error, Format, Header, Message, MessageKind, MidiFile, MidiFileView, Track,
};
use pretty_assertions::assert_eq;

/// `MThd` with the given format, track count and ticks/quarter.
fn header_bytes(format: u16, track_count: u16, division: u16) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&track_count.to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    bytes
}

/// Wrap a track body in an `MTrk` chunk.
fn track_chunk(body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
    bytes.extend_from_slice(body);
    bytes
}

#[test]
fn empty_file_body() {
    let bytes = header_bytes(0, 0, 480);
    let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
    assert!(smf.tracks.is_empty());
    assert_eq!(smf.header.format, Format::SingleTrack);
    assert_eq!(smf.to_bytes(), bytes);
}

#[test]
fn single_note_on_at_tick_zero() {
    let bytes = [
        0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, // MThd
        0x00, 0x00, 0x00, 0x01, 0x01, 0xE0, // format 0, 1 track, 480 tpq
        0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x08, // MTrk
        0x00, 0x90, 0x3C, 0x64, // NoteOn
        0x00, 0xFF, 0x2F, 0x00, // EndOfTrack
    ];
    let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
    assert_eq!(smf.header.format, Format::SingleTrack);
    assert_eq!(smf.header.division, Division::TicksPerQuarter(480));
    assert_eq!(smf.tracks.len(), 1);
    assert_eq!(smf.tracks[0].len(), 1);

    let msg = &smf.tracks[0].messages[0];
    assert_eq!(msg.time, 0);
    let note = msg.as_note_on().unwrap();
    assert_eq!(note.channel(), 0);
    assert_eq!(note.pitch(), 60);
    assert_eq!(note.velocity(), 100);

    assert_eq!(smf.to_bytes(), bytes);
}

#[test]
fn running_status_full_file() {
    let body = [
        0x00, 0x90, 0x3C, 0x64, //
        0x10, 0x3C, 0x00, //
        0x20, 0x40, 0x64, //
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend_from_slice(&track_chunk(&body));

    let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
    let track = &smf.tracks[0];
    assert_eq!(track.len(), 3);
    let times: Vec<u32> = track.messages.iter().map(|m| m.time).collect();
    assert_eq!(times, [0, 16, 48]);
    for msg in &track.messages {
        assert_eq!(msg.kind(), MessageKind::NoteOn);
    }
    // The encoder compresses the repeated statuses right back.
    assert_eq!(smf.to_bytes(), bytes);
}

#[test]
fn unknown_chunk_is_skipped() {
    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend_from_slice(b"XYZq");
    bytes.extend_from_slice(&8u32.to_be_bytes());
    bytes.extend_from_slice(&[0xAA; 8]);
    bytes.extend_from_slice(&track_chunk(&[
        0x00, 0x90, 0x3C, 0x64, 0x00, 0xFF, 0x2F, 0x00,
    ]));

    let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 1);
    assert_eq!(smf.tracks[0].len(), 1);

    let reencoded = smf.to_bytes();
    assert!(!reencoded.windows(4).any(|w| w == b"XYZq"));
}

#[test]
fn sysex_roundtrip() {
    let event = [0xF0, 0x05, 0x7E, 0x7F, 0x06, 0x01, 0xF7];
    let mut body = vec![0x00];
    body.extend_from_slice(&event);
    body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend_from_slice(&track_chunk(&body));

    let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
    let msg = &smf.tracks[0].messages[0];
    assert_eq!(msg.kind(), MessageKind::SysExStart);
    // Payload starts after the status byte; the VLQ length counts the
    // terminating 0xF7.
    assert_eq!(msg.data(), &event[1..]);

    let reencoded = smf.to_bytes();
    assert!(reencoded.windows(event.len()).any(|w| w == event));
    assert_eq!(reencoded, bytes);
}

#[test]
fn set_tempo_accessor() {
    let body = [
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // SetTempo 500000
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend_from_slice(&track_chunk(&body));

    let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
    let msg = &smf.tracks[0].messages[0];
    let tempo = msg
        .as_meta()
        .unwrap()
        .as_set_tempo()
        .unwrap()
        .tempo()
        .unwrap();
    assert_eq!(tempo, 500_000);
}

#[test]
fn smpte_division_components() {
    // -25 fps, 40 ticks per frame.
    let bytes = header_bytes(0, 0, 0xE728);
    let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
    let division = smf.header.division;
    assert_eq!(division.ticks_per_quarter(), None);
    assert_eq!(division.frames_per_second(), Some(25));
    assert_eq!(division.ticks_per_second(), Some(25 * 40));
    assert_eq!(smf.to_bytes(), bytes);
}

#[test]
fn fewer_chunks_than_declared() {
    // Header declares two tracks but only one chunk follows; the missing
    // track must not be fabricated.
    let mut bytes = header_bytes(1, 2, 480);
    bytes.extend_from_slice(&track_chunk(&[0x00, 0xFF, 0x2F, 0x00]));
    let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 1);
}

#[test]
fn view_and_owned_agree() {
    let mut bytes = header_bytes(1, 2, 96);
    bytes.extend_from_slice(&track_chunk(&[
        0x00, 0x90, 0x3C, 0x64, 0x40, 0x3C, 0x00, 0x00, 0xFF, 0x2F, 0x00,
    ]));
    bytes.extend_from_slice(&track_chunk(&[
        0x00, 0xC0, 0x0C, 0x00, 0xFF, 0x2F, 0x00,
    ]));

    let view = MidiFileView::parse(&bytes).unwrap();
    assert_eq!(view.track_count(), 2);
    let from_view: MidiFile = MidiFile::from_view(&view).unwrap();
    let parsed: MidiFile = MidiFile::parse(&bytes).unwrap();
    assert_eq!(from_view, parsed);

    let mut lazy_messages = Vec::new();
    for track in view.tracks() {
        for msg in track.unwrap() {
            lazy_messages.push(msg.unwrap().into_owned());
        }
    }
    let eager_messages: Vec<Message> = parsed
        .tracks
        .iter()
        .flat_map(|t| t.messages.iter().cloned())
        .collect();
    assert_eq!(lazy_messages, eager_messages);
}

#[test]
fn encoder_is_a_fixed_point_on_its_own_output() {
    // An unsorted track with a stray EndOfTrack, exercising every message
    // shape the encoder treats specially.
    let mut track: Track = Track::default();
    track.messages.push(Message::note_off(480, 0, 60, 0));
    track.messages.push(Message::note_on(0, 0, 60, 100));
    track.messages.push(Message::end_of_track(3));
    track.messages.push(Message::sys_ex(240, &[0x7E, 0x09, 0x01]));
    track.messages.push(Message::set_tempo(0, 500_000));
    track.messages.push(Message::control_change(480, 0, 64, 127));

    let mut other: Track = Track::default();
    other.messages.push(Message::program_change(0, 9, 35));
    other.messages.push(Message::note_on(0, 9, 36, 120));

    let smf = MidiFile::new(
        Header::new(Format::MultiTrack, Division::TicksPerQuarter(480)),
        vec![track, other],
    );

    let first = smf.to_bytes();
    let decoded: MidiFile = MidiFile::parse(&first).unwrap();
    let second = decoded.to_bytes();
    assert_eq!(first, second);

    // The decoded tracks are message-equivalent to the stably sorted input.
    for (original, reparsed) in smf.tracks.iter().zip(&decoded.tracks) {
        let sorted = original.sorted();
        assert_eq!(sorted.len(), reparsed.len());
        for (a, b) in sorted.messages.iter().zip(&reparsed.messages) {
            assert_eq!(a.time, b.time);
            assert_eq!(a.status, b.status);
            assert_eq!(a.data(), b.data());
        }
    }
}

#[test]
fn no_running_status_for_meta_or_sysex_after_encode() {
    let mut track: Track = Track::default();
    for _ in 0..3 {
        track.messages.push(Message::sys_ex(0, &[0x01]));
        track.messages.push(Message::set_tempo(0, 500_000));
    }
    let smf = MidiFile::new(
        Header::new(Format::SingleTrack, Division::TicksPerQuarter(96)),
        vec![track],
    );
    let bytes = smf.to_bytes();
    // Reparse lazily and make sure every yielded message saw its own status
    // byte (the decoder would otherwise misparse the stream).
    let view = MidiFileView::parse(&bytes).unwrap();
    let mut count = 0;
    for track in view.tracks() {
        for msg in track.unwrap() {
            let msg = msg.unwrap();
            assert!(matches!(msg.status, 0xF0 | 0xFF));
            count += 1;
        }
    }
    assert_eq!(count, 6);
}

#[test]
fn truncations_never_panic() {
    let mut bytes = header_bytes(1, 2, 480);
    bytes.extend_from_slice(&track_chunk(&[
        0x00, 0x90, 0x3C, 0x64, //
        0x10, 0x3C, 0x00, //
        0x00, 0xF0, 0x03, 0x7E, 0x01, 0xF7, //
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, //
        0x00, 0xFF, 0x2F, 0x00,
    ]));
    bytes.extend_from_slice(&track_chunk(&[0x00, 0xC0, 0x0C, 0x00, 0xFF, 0x2F, 0x00]));

    for len in 0..bytes.len() {
        let _ = MidiFile::<minismf::SmallBytes>::parse(&bytes[..len]);
    }
}

#[test]
fn corruptions_decode_or_fail_cleanly() {
    let mut bytes = header_bytes(0, 1, 480);
    bytes.extend_from_slice(&track_chunk(&[
        0x00, 0x90, 0x3C, 0x64, //
        0x10, 0x3C, 0x00, //
        0x00, 0xFF, 0x2F, 0x00,
    ]));

    for i in 0..bytes.len() {
        for flip in [0x01, 0x80, 0xFF] {
            let mut mutated = bytes.clone();
            mutated[i] ^= flip;
            match MidiFile::<minismf::SmallBytes>::parse(&mutated) {
                Ok(_) => {}
                Err(
                    Error::InvalidHeader(_)
                    | Error::UnexpectedEof { .. }
                    | Error::Corrupted(_)
                    | Error::OutOfRange(_),
                ) => {}
                Err(other) => panic!("unexpected error kind: {:?}", other),
            }
        }
    }
}
