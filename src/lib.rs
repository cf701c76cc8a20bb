//! # Overview
//!
//! `minismf` is a small, fast reader and writer for Standard MIDI Files
//! (`.mid` and `.midi` files, formats 0, 1 and 2).
//!
//! Parsing a file is usually done through the owning [`MidiFile`] type:
//!
//! ```no_run
//! use minismf::MidiFile;
//!
//! let bytes = std::fs::read("song.mid").unwrap();
//! let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
//!
//! for (i, track) in smf.tracks.iter().enumerate() {
//!     println!("track {} has {} messages", i, track.len());
//! }
//! ```
//!
//! Every message carries its absolute tick, its status byte and its data
//! bytes in wire form. Semantic access goes through per-kind views:
//!
//! ```no_run
//! # use minismf::MidiFile;
//! # let bytes = std::fs::read("song.mid").unwrap();
//! # let smf: MidiFile = MidiFile::parse(&bytes).unwrap();
//! for track in &smf.tracks {
//!     for msg in &track.messages {
//!         if let Some(note) = msg.as_note_on() {
//!             println!("note {} at tick {}", note.pitch(), msg.time);
//!         }
//!     }
//! }
//! ```
//!
//! # Zero-copy parsing
//!
//! [`MidiFile`] copies every payload into a small-buffer container, so the
//! source bytes can be dropped afterwards. When traversing a file once,
//! [`MidiFileView`] avoids those copies entirely: it borrows the byte
//! buffer and yields [`TrackView`]s whose iterators decode messages on
//! demand, referencing the original bytes.
//!
//! ```no_run
//! use minismf::MidiFileView;
//!
//! let bytes = std::fs::read("song.mid").unwrap();
//! let view = MidiFileView::parse(&bytes).unwrap();
//! for track in view.tracks() {
//!     for msg in track.unwrap() {
//!         println!("{}", msg.unwrap());
//!     }
//! }
//! ```
//!
//! # Writing
//!
//! Messages are built with per-kind constructors and written back with
//! [`MidiFile::to_bytes`] or [`MidiFile::save`]. The encoder stably sorts
//! each track by time, re-applies running-status compression and appends
//! its own `EndOfTrack`, so tracks can be assembled in any order:
//!
//! ```
//! use minismf::{Division, Format, Header, Message, MidiFile, Track};
//!
//! let mut track: Track = Track::default();
//! track.messages.push(Message::note_on(0, 0, 60, 100));
//! track.messages.push(Message::note_off(480, 0, 60, 0));
//!
//! let smf = MidiFile::new(
//!     Header::new(Format::SingleTrack, Division::TicksPerQuarter(480)),
//!     vec![track],
//! );
//! let bytes = smf.to_bytes();
//! # assert!(bytes.starts_with(b"MThd"));
//! ```
//!
//! # About features
//!
//! - `parallel` (enabled by default)
//!
//!   Materialize the tracks of large files using multiple threads.
//!   Disabling this feature removes the dependency on `rayon`.

mod error;
mod message;
mod primitive;
mod smf;
mod track;

pub use crate::{
    error::{Error, Result},
    message::{
        Bytes, ChannelAfterTouch, ControlChange, KeySignature, Message, MessageKind, Meta,
        MetaKind, NoteOff, NoteOn, PitchBend, PolyphonicAfterTouch, ProgramChange, QuarterFrame,
        SetTempo, SmallBytes, SmpteOffset, SongPositionPointer, TimeSignature,
        MAX_PITCH_BEND, MIN_PITCH_BEND,
    },
    primitive::{read_msb, read_vlq, vlq_len, write_msb, write_vlq},
    smf::{Division, Format, Header, MidiFile, MidiFileView, TrackChunkIter, HEADER_LEN},
    track::{EventIter, Track, TrackView},
};
