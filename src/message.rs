//! The message model: a tagged payload-carrying event and its per-kind views.
//!
//! A [`Message`] keeps its data bytes exactly as they appear on the wire
//! (status byte excluded), so decoding is slicing and encoding is copying.
//! Semantic access goes through per-kind wrapper types obtained with the
//! `as_*` methods, and construction goes through per-kind constructors that
//! emit the correct bytes.

use std::fmt;
use std::iter;

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::primitive::{read_msb, read_vlq, vlq_bytes};

/// A heap-allocated byte payload, for code that mostly carries large
/// SysEx dumps or text metas.
pub type Bytes = Vec<u8>;

/// The default payload container: seven bytes of inline capacity, so the
/// common channel messages and short metas never allocate.
pub type SmallBytes = SmallVec<[u8; 7]>;

/// Lowest expressible pitch-bend value (full bend downwards).
pub const MIN_PITCH_BEND: i16 = -8192;
/// Highest expressible pitch-bend value (full bend upwards).
pub const MAX_PITCH_BEND: i16 = 8191;

/// Source-of-truth table of `(kind, status byte, total wire length)`.
///
/// A length of `0xFFFF` marks kinds whose length is driven by an embedded
/// variable-length quantity. The table feeds the enum, the per-kind status
/// and length arrays, and the 256-entry status lookup table below.
macro_rules! message_kinds {
    ($( $(#[$attr:meta])* $name:ident = ($status:literal, $len:literal), )*) => {
        /// Classification of a message by its status byte.
        ///
        /// Voice kinds cover a full 16-value status range (the low nibble is
        /// the channel); system kinds map to a single status byte.
        #[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
        pub enum MessageKind {
            $( $(#[$attr])* $name, )*
        }

        const KIND_COUNT: usize = [$( $status as u8, )*].len();
        const KIND_STATUS: [u8; KIND_COUNT] = [$( $status, )*];
        const KIND_LIST: [MessageKind; KIND_COUNT] = [$( MessageKind::$name, )*];
        const KIND_LEN: [u16; KIND_COUNT] = [$( $len, )*];

        impl MessageKind {
            /// The kind's name, e.g. `"NoteOn"`.
            pub fn name(self) -> &'static str {
                match self {
                    $( MessageKind::$name => stringify!($name), )*
                }
            }
        }
    };
}

message_kinds! {
    /// A status byte this crate cannot classify.
    Unknown = (0x00, 0xFFFF),
    NoteOff = (0x80, 3),
    NoteOn = (0x90, 3),
    PolyphonicAfterTouch = (0xA0, 3),
    ControlChange = (0xB0, 3),
    ProgramChange = (0xC0, 2),
    ChannelAfterTouch = (0xD0, 2),
    PitchBend = (0xE0, 3),
    SysExStart = (0xF0, 0xFFFF),
    QuarterFrame = (0xF1, 2),
    SongPositionPointer = (0xF2, 3),
    SongSelect = (0xF3, 2),
    TuneRequest = (0xF6, 1),
    SysExEnd = (0xF7, 0xFFFF),
    TimingClock = (0xF8, 1),
    StartSequence = (0xFA, 1),
    ContinueSequence = (0xFB, 1),
    StopSequence = (0xFC, 1),
    ActiveSensing = (0xFE, 1),
    Meta = (0xFF, 0xFFFF),
}

const fn build_status_table() -> [MessageKind; 256] {
    let mut table = [MessageKind::Unknown; 256];
    let mut i = 0;
    while i < KIND_COUNT {
        let status = KIND_STATUS[i] as usize;
        if status >= 0x80 && status < 0xF0 {
            // Voice kinds own the whole channel nibble.
            let mut channel = 0;
            while channel < 0x10 {
                table[status | channel] = KIND_LIST[i];
                channel += 1;
            }
        } else if status >= 0xF0 {
            table[status] = KIND_LIST[i];
        }
        i += 1;
    }
    table
}

const STATUS_TO_KIND: [MessageKind; 256] = build_status_table();

impl MessageKind {
    /// Classify a status byte.
    #[inline]
    pub fn from_status(status: u8) -> MessageKind {
        STATUS_TO_KIND[status as usize]
    }

    /// The kind's base status byte (channel nibble zero for voice kinds).
    #[inline]
    pub fn status(self) -> u8 {
        KIND_STATUS[self as usize]
    }

    /// Total wire length of an event of this kind, status byte included,
    /// or `None` when the length is driven by an embedded VLQ.
    #[inline]
    pub fn fixed_len(self) -> Option<usize> {
        match KIND_LEN[self as usize] {
            0xFFFF => None,
            n => Some(n as usize),
        }
    }
}

/// Source-of-truth table of `(meta kind, meta status byte)`.
macro_rules! meta_kinds {
    ($( $(#[$attr:meta])* $name:ident = $status:literal, )*) => {
        /// Classification of a meta event by the byte following `0xFF`.
        #[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
        #[repr(u8)]
        pub enum MetaKind {
            $( $(#[$attr])* $name = $status, )*
        }

        impl MetaKind {
            /// Classify a meta-type byte.
            pub fn from_status(status: u8) -> MetaKind {
                match status {
                    $( $status => MetaKind::$name, )*
                    _ => MetaKind::Unknown,
                }
            }

            /// The meta-type byte of this kind.
            #[inline]
            pub fn status(self) -> u8 {
                self as u8
            }

            /// The kind's name, e.g. `"SetTempo"`.
            pub fn name(self) -> &'static str {
                match self {
                    $( MetaKind::$name => stringify!($name), )*
                }
            }
        }
    };
}

meta_kinds! {
    SequenceNumber = 0x00,
    Text = 0x01,
    CopyrightNote = 0x02,
    TrackName = 0x03,
    InstrumentName = 0x04,
    Lyric = 0x05,
    Marker = 0x06,
    CuePoint = 0x07,
    MidiChannelPrefix = 0x20,
    EndOfTrack = 0x2F,
    SetTempo = 0x51,
    SmpteOffset = 0x54,
    TimeSignature = 0x58,
    KeySignature = 0x59,
    SequencerSpecific = 0x7F,
    /// A meta-type byte this crate cannot classify.
    Unknown = 0xFF,
}

/// A single track event: an absolute tick, a status byte and the event's
/// data bytes in wire form.
///
/// The payload excludes the status byte. For meta events it is the
/// meta-type byte, the VLQ-encoded value length and the value bytes; for
/// SysEx it is the VLQ-encoded length followed by the contents (including
/// the terminating `0xF7` when the writer emitted one).
///
/// The payload container `B` is [`SmallBytes`] by default. Messages yielded
/// by the view types instead borrow their payload (`B = &[u8]`); such
/// messages decode but cannot be constructed from semantic parameters.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Message<B = SmallBytes> {
    /// Absolute tick from the start of the track. Deltas exist only on the
    /// wire.
    pub time: u32,
    /// The event status, channel nibble included for voice messages.
    pub status: u8,
    data: B,
}

impl<B> Message<B> {
    /// Assemble a message from raw parts. The payload must already be in
    /// wire form.
    pub fn new(time: u32, status: u8, data: B) -> Message<B> {
        Message { time, status, data }
    }

    /// Classify this message by its status byte.
    #[inline]
    pub fn kind(&self) -> MessageKind {
        MessageKind::from_status(self.status)
    }

    /// The channel nibble of the status byte. Only meaningful for voice
    /// messages.
    #[inline]
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    /// Consume the message, returning its payload container.
    pub fn into_data(self) -> B {
        self.data
    }
}

impl<B: AsRef<[u8]>> Message<B> {
    /// The payload bytes, status byte excluded.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Whether this is an `EndOfTrack` meta message.
    pub fn is_end_of_track(&self) -> bool {
        self.kind() == MessageKind::Meta
            && self
                .data()
                .first()
                .map_or(false, |&b| MetaKind::from_status(b) == MetaKind::EndOfTrack)
    }
}

impl<'a> Message<&'a [u8]> {
    /// Copy the borrowed payload into an owning container.
    pub fn into_owned<B: FromIterator<u8>>(self) -> Message<B> {
        Message {
            time: self.time,
            status: self.status,
            data: self.data.iter().copied().collect(),
        }
    }
}

impl<B: FromIterator<u8>> Message<B> {
    fn voice(time: u32, kind: MessageKind, channel: u8, data: impl IntoIterator<Item = u8>) -> Message<B> {
        Message::new(time, kind.status() | (channel & 0x0F), data.into_iter().collect())
    }

    fn system(time: u32, kind: MessageKind, data: impl IntoIterator<Item = u8>) -> Message<B> {
        Message::new(time, kind.status(), data.into_iter().collect())
    }

    pub fn note_on(time: u32, channel: u8, pitch: u8, velocity: u8) -> Message<B> {
        Self::voice(time, MessageKind::NoteOn, channel, [pitch, velocity])
    }

    pub fn note_off(time: u32, channel: u8, pitch: u8, velocity: u8) -> Message<B> {
        Self::voice(time, MessageKind::NoteOff, channel, [pitch, velocity])
    }

    pub fn polyphonic_after_touch(time: u32, channel: u8, pitch: u8, pressure: u8) -> Message<B> {
        Self::voice(time, MessageKind::PolyphonicAfterTouch, channel, [pitch, pressure])
    }

    pub fn control_change(time: u32, channel: u8, control_number: u8, control_value: u8) -> Message<B> {
        Self::voice(time, MessageKind::ControlChange, channel, [control_number, control_value])
    }

    pub fn program_change(time: u32, channel: u8, program: u8) -> Message<B> {
        Self::voice(time, MessageKind::ProgramChange, channel, [program])
    }

    pub fn channel_after_touch(time: u32, channel: u8, pressure: u8) -> Message<B> {
        Self::voice(time, MessageKind::ChannelAfterTouch, channel, [pressure])
    }

    /// `value` is the signed bend in `MIN_PITCH_BEND..=MAX_PITCH_BEND`;
    /// it is rebiased by +8192 into the 14-bit wire value.
    pub fn pitch_bend(time: u32, channel: u8, value: i16) -> Message<B> {
        let raw = (i32::from(value) - i32::from(MIN_PITCH_BEND)) as u16;
        Self::voice(
            time,
            MessageKind::PitchBend,
            channel,
            [(raw & 0x7F) as u8, ((raw >> 7) & 0x7F) as u8],
        )
    }

    /// Wraps `contents` with a leading VLQ length and a trailing `0xF7`.
    /// The length counts the trailing `0xF7`.
    pub fn sys_ex(time: u32, contents: &[u8]) -> Message<B> {
        let len = contents.len() as u32 + 1;
        Message::new(
            time,
            MessageKind::SysExStart.status(),
            vlq_bytes(len)
                .chain(contents.iter().copied())
                .chain(iter::once(0xF7))
                .collect(),
        )
    }

    pub fn quarter_frame(time: u32, frame_type: u8, frame_value: u8) -> Message<B> {
        Self::system(
            time,
            MessageKind::QuarterFrame,
            [(frame_type << 4) | (frame_value & 0x0F)],
        )
    }

    /// `position` is the 14-bit song position in MIDI beats.
    pub fn song_position_pointer(time: u32, position: u16) -> Message<B> {
        Self::system(
            time,
            MessageKind::SongPositionPointer,
            [(position & 0x7F) as u8, ((position >> 7) & 0x7F) as u8],
        )
    }

    pub fn song_select(time: u32, song: u8) -> Message<B> {
        Self::system(time, MessageKind::SongSelect, [song])
    }

    pub fn tune_request(time: u32) -> Message<B> {
        Self::system(time, MessageKind::TuneRequest, iter::empty())
    }

    pub fn timing_clock(time: u32) -> Message<B> {
        Self::system(time, MessageKind::TimingClock, iter::empty())
    }

    pub fn start_sequence(time: u32) -> Message<B> {
        Self::system(time, MessageKind::StartSequence, iter::empty())
    }

    pub fn continue_sequence(time: u32) -> Message<B> {
        Self::system(time, MessageKind::ContinueSequence, iter::empty())
    }

    pub fn stop_sequence(time: u32) -> Message<B> {
        Self::system(time, MessageKind::StopSequence, iter::empty())
    }

    pub fn active_sensing(time: u32) -> Message<B> {
        Self::system(time, MessageKind::ActiveSensing, iter::empty())
    }

    /// Generic meta constructor: emits the meta-type byte, the VLQ-encoded
    /// length of `value` and the value bytes.
    pub fn meta_event(time: u32, kind: MetaKind, value: &[u8]) -> Message<B> {
        Message::new(
            time,
            MessageKind::Meta.status(),
            iter::once(kind.status())
                .chain(vlq_bytes(value.len() as u32))
                .chain(value.iter().copied())
                .collect(),
        )
    }

    pub fn sequence_number(time: u32, number: u16) -> Message<B> {
        Self::meta_event(time, MetaKind::SequenceNumber, &number.to_be_bytes())
    }

    pub fn text(time: u32, text: &str) -> Message<B> {
        Self::meta_event(time, MetaKind::Text, text.as_bytes())
    }

    pub fn copyright_note(time: u32, text: &str) -> Message<B> {
        Self::meta_event(time, MetaKind::CopyrightNote, text.as_bytes())
    }

    pub fn track_name(time: u32, name: &str) -> Message<B> {
        Self::meta_event(time, MetaKind::TrackName, name.as_bytes())
    }

    pub fn instrument_name(time: u32, name: &str) -> Message<B> {
        Self::meta_event(time, MetaKind::InstrumentName, name.as_bytes())
    }

    pub fn lyric(time: u32, lyric: &str) -> Message<B> {
        Self::meta_event(time, MetaKind::Lyric, lyric.as_bytes())
    }

    pub fn marker(time: u32, marker: &str) -> Message<B> {
        Self::meta_event(time, MetaKind::Marker, marker.as_bytes())
    }

    pub fn cue_point(time: u32, cue_point: &str) -> Message<B> {
        Self::meta_event(time, MetaKind::CuePoint, cue_point.as_bytes())
    }

    pub fn midi_channel_prefix(time: u32, channel: u8) -> Message<B> {
        Self::meta_event(time, MetaKind::MidiChannelPrefix, &[channel])
    }

    /// `tempo` is in microseconds per quarter note.
    pub fn set_tempo(time: u32, tempo: u32) -> Message<B> {
        Self::meta_event(
            time,
            MetaKind::SetTempo,
            &[(tempo >> 16) as u8, (tempo >> 8) as u8, tempo as u8],
        )
    }

    /// The denominator is stored as its base-2 logarithm, rounded down for
    /// values that are not a power of two.
    pub fn time_signature(time: u32, numerator: u8, denominator: u8) -> Message<B> {
        let log2_den = denominator.checked_ilog2().unwrap_or(0) as u8;
        Self::meta_event(
            time,
            MetaKind::TimeSignature,
            &[numerator, log2_den, 0x18, 0x08],
        )
    }

    /// `key` counts sharps (positive) or flats (negative); `tonality` is 0
    /// for major, 1 for minor.
    pub fn key_signature(time: u32, key: i8, tonality: u8) -> Message<B> {
        Self::meta_event(time, MetaKind::KeySignature, &[key as u8, tonality])
    }

    pub fn smpte_offset(
        time: u32,
        hour: u8,
        minute: u8,
        second: u8,
        frame: u8,
        subframe: u8,
    ) -> Message<B> {
        Self::meta_event(
            time,
            MetaKind::SmpteOffset,
            &[hour, minute, second, frame, subframe],
        )
    }

    pub fn end_of_track(time: u32) -> Message<B> {
        Self::meta_event(time, MetaKind::EndOfTrack, &[])
    }
}

/// Generates a per-kind view type together with its `as_*` downcast.
/// The downcast checks the kind and the minimum payload length, so the
/// accessors can index without further checks.
macro_rules! message_view {
    (
        $(#[$doc:meta])*
        $name:ident($getter:ident, $kind:ident, $min_len:literal) {
            $( $(#[$acc_doc:meta])* fn $acc:ident $params:tt -> $ret:ty $body:block )*
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name<'m, B> {
            msg: &'m Message<B>,
        }

        // The derived impls would needlessly require `B: Copy`.
        impl<'m, B> Copy for $name<'m, B> {}
        impl<'m, B> Clone for $name<'m, B> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<B: AsRef<[u8]>> Message<B> {
            #[doc = concat!(
                "View this message as [`", stringify!($name),
                "`]. Returns `None` if it is another kind or its payload is too short."
            )]
            pub fn $getter(&self) -> Option<$name<'_, B>> {
                (self.kind() == MessageKind::$kind && self.data().len() >= $min_len)
                    .then(|| $name { msg: self })
            }
        }

        impl<'m, B: AsRef<[u8]>> $name<'m, B> {
            /// The underlying message.
            pub fn message(&self) -> &'m Message<B> {
                self.msg
            }

            $( $(#[$acc_doc])* pub fn $acc $params -> $ret $body )*
        }
    };
}

macro_rules! key_velocity_views {
    ($( $name:ident($getter:ident, $kind:ident, $second:ident), )*) => {$(
        message_view! {
            $name($getter, $kind, 2) {
                fn channel(&self) -> u8 { self.msg.channel() }
                fn pitch(&self) -> u8 { self.msg.data()[0] }
                fn $second(&self) -> u8 { self.msg.data()[1] }
            }
        }
    )*};
}

key_velocity_views! {
    NoteOn(as_note_on, NoteOn, velocity),
    NoteOff(as_note_off, NoteOff, velocity),
    PolyphonicAfterTouch(as_polyphonic_after_touch, PolyphonicAfterTouch, velocity),
}

message_view! {
    ControlChange(as_control_change, ControlChange, 2) {
        fn channel(&self) -> u8 { self.msg.channel() }
        fn control_number(&self) -> u8 { self.msg.data()[0] }
        fn control_value(&self) -> u8 { self.msg.data()[1] }
    }
}

message_view! {
    ProgramChange(as_program_change, ProgramChange, 1) {
        fn channel(&self) -> u8 { self.msg.channel() }
        fn program(&self) -> u8 { self.msg.data()[0] }
    }
}

message_view! {
    ChannelAfterTouch(as_channel_after_touch, ChannelAfterTouch, 1) {
        fn channel(&self) -> u8 { self.msg.channel() }
        fn pressure(&self) -> u8 { self.msg.data()[0] }
    }
}

message_view! {
    PitchBend(as_pitch_bend, PitchBend, 2) {
        fn channel(&self) -> u8 { self.msg.channel() }

        /// The signed bend value in `MIN_PITCH_BEND..=MAX_PITCH_BEND`.
        fn pitch_bend(&self) -> i16 {
            let d = self.msg.data();
            (i16::from(d[0] & 0x7F) | (i16::from(d[1] & 0x7F) << 7)) + MIN_PITCH_BEND
        }
    }
}

message_view! {
    SongPositionPointer(as_song_position_pointer, SongPositionPointer, 2) {
        /// The 14-bit song position in MIDI beats.
        fn position(&self) -> u16 {
            let d = self.msg.data();
            u16::from(d[0] & 0x7F) | (u16::from(d[1] & 0x7F) << 7)
        }
    }
}

message_view! {
    QuarterFrame(as_quarter_frame, QuarterFrame, 1) {
        fn frame_type(&self) -> u8 { self.msg.data()[0] >> 4 }
        fn frame_value(&self) -> u8 { self.msg.data()[0] & 0x0F }
    }
}

message_view! {
    /// Generic view over any meta event.
    Meta(as_meta, Meta, 1) {
        /// Classify the meta event by its meta-type byte.
        fn meta_kind(&self) -> MetaKind {
            MetaKind::from_status(self.msg.data()[0])
        }

        /// The raw meta-type byte.
        fn meta_type(&self) -> u8 {
            self.msg.data()[0]
        }
    }
}

impl<'m, B: AsRef<[u8]>> Meta<'m, B> {
    /// The meta value: the bytes following the embedded VLQ length.
    pub fn meta_value(&self) -> Result<&'m [u8]> {
        let mut cursor = &self.msg.data.as_ref()[1..];
        let len = read_vlq(&mut cursor)
            .map_err(|_| Error::OutOfRange("meta length field is truncated"))?
            as usize;
        if len > cursor.len() {
            return Err(Error::OutOfRange("meta value overruns the payload"));
        }
        Ok(&cursor[..len])
    }

    pub fn as_set_tempo(&self) -> Option<SetTempo<'m, B>> {
        (self.meta_kind() == MetaKind::SetTempo).then(|| SetTempo { meta: *self })
    }

    pub fn as_time_signature(&self) -> Option<TimeSignature<'m, B>> {
        (self.meta_kind() == MetaKind::TimeSignature).then(|| TimeSignature { meta: *self })
    }

    pub fn as_key_signature(&self) -> Option<KeySignature<'m, B>> {
        (self.meta_kind() == MetaKind::KeySignature).then(|| KeySignature { meta: *self })
    }

    pub fn as_smpte_offset(&self) -> Option<SmpteOffset<'m, B>> {
        (self.meta_kind() == MetaKind::SmpteOffset).then(|| SmpteOffset { meta: *self })
    }
}

/// Generates a view type over one specific meta kind, wrapping [`Meta`].
macro_rules! meta_view {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name<'m, B> {
            meta: Meta<'m, B>,
        }

        impl<'m, B> Copy for $name<'m, B> {}
        impl<'m, B> Clone for $name<'m, B> {
            fn clone(&self) -> Self {
                *self
            }
        }
    };
}

meta_view! {
    /// View over a `SetTempo` meta event.
    SetTempo
}

impl<'m, B: AsRef<[u8]>> SetTempo<'m, B> {
    /// The tempo in microseconds per quarter note.
    pub fn tempo(&self) -> Result<u32> {
        let mut value = self.meta.meta_value()?;
        let tempo = read_msb(&mut value, 3)
            .map_err(|_| Error::OutOfRange("tempo meta value is shorter than 3 bytes"))?;
        Ok(tempo as u32)
    }
}

meta_view! {
    /// View over a `TimeSignature` meta event.
    TimeSignature
}

impl<'m, B: AsRef<[u8]>> TimeSignature<'m, B> {
    fn byte(&self, index: usize, what: &'static str) -> Result<u8> {
        self.meta
            .meta_value()?
            .get(index)
            .copied()
            .ok_or(Error::OutOfRange(what))
    }

    pub fn numerator(&self) -> Result<u8> {
        self.byte(0, "time signature value is missing its numerator")
    }

    /// The denominator; the stored byte is its base-2 logarithm.
    pub fn denominator(&self) -> Result<u32> {
        let log2_den = self.byte(1, "time signature value is missing its denominator")?;
        if log2_den >= 32 {
            return Err(Error::OutOfRange("time signature denominator exponent is too large"));
        }
        Ok(1 << log2_den)
    }
}

meta_view! {
    /// View over a `KeySignature` meta event.
    KeySignature
}

const KEY_NAMES: [&str; 30] = [
    "bC", "bG", "bD", "bA", "bE", "bB", "F", "C", "G", "D", "A", "E", "B", "#F", "#C",
    "bc", "bg", "bd", "ba", "be", "bb", "f", "c", "g", "d", "a", "e", "b", "#f", "#c",
];

impl<'m, B: AsRef<[u8]>> KeySignature<'m, B> {
    fn byte(&self, index: usize, what: &'static str) -> Result<u8> {
        self.meta
            .meta_value()?
            .get(index)
            .copied()
            .ok_or(Error::OutOfRange(what))
    }

    /// Sharps (positive) or flats (negative), in `-7..=7`.
    pub fn key(&self) -> Result<i8> {
        Ok(self.byte(0, "key signature value is missing its key")? as i8)
    }

    /// 0 for major, 1 for minor.
    pub fn tonality(&self) -> Result<u8> {
        self.byte(1, "key signature value is missing its tonality")
    }

    /// Conventional name of the key, e.g. `"C"`, `"bE"` or `"#f"`.
    pub fn name(&self) -> Result<&'static str> {
        let key = self.key()?;
        let tonality = self.tonality()?;
        if tonality > 1 {
            return Err(Error::OutOfRange("key signature tonality must be 0 or 1"));
        }
        if !(-7..=7).contains(&key) {
            return Err(Error::OutOfRange("key signature key must be within -7..=7"));
        }
        Ok(KEY_NAMES[(key + 7) as usize + usize::from(tonality) * 15])
    }
}

meta_view! {
    /// View over an `SmpteOffset` meta event.
    SmpteOffset
}

impl<'m, B: AsRef<[u8]>> SmpteOffset<'m, B> {
    fn byte(&self, index: usize, what: &'static str) -> Result<u8> {
        self.meta
            .meta_value()?
            .get(index)
            .copied()
            .ok_or(Error::OutOfRange(what))
    }

    pub fn hour(&self) -> Result<u8> {
        self.byte(0, "smpte offset value is missing its hour")
    }

    pub fn minute(&self) -> Result<u8> {
        self.byte(1, "smpte offset value is missing its minute")
    }

    pub fn second(&self) -> Result<u8> {
        self.byte(2, "smpte offset value is missing its second")
    }

    pub fn frame(&self) -> Result<u8> {
        self.byte(3, "smpte offset value is missing its frame")
    }

    pub fn subframe(&self) -> Result<u8> {
        self.byte(4, "smpte offset value is missing its subframe")
    }
}

impl<B: AsRef<[u8]>> fmt::Display for Message<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "time={} | ", self.time)?;
        if let Some(m) = self.as_note_on() {
            write!(
                f,
                "NoteOn: channel={} pitch={} velocity={}",
                m.channel(),
                m.pitch(),
                m.velocity()
            )
        } else if let Some(m) = self.as_note_off() {
            write!(
                f,
                "NoteOff: channel={} pitch={} velocity={}",
                m.channel(),
                m.pitch(),
                m.velocity()
            )
        } else if let Some(m) = self.as_control_change() {
            write!(
                f,
                "ControlChange: channel={} control_number={} control_value={}",
                m.channel(),
                m.control_number(),
                m.control_value()
            )
        } else if let Some(m) = self.as_program_change() {
            write!(f, "ProgramChange: channel={} program={}", m.channel(), m.program())
        } else if let Some(m) = self.as_pitch_bend() {
            write!(f, "PitchBend: channel={} value={}", m.channel(), m.pitch_bend())
        } else if let Some(m) = self.as_meta() {
            fmt_meta(f, &m)
        } else {
            write!(
                f,
                "{}: status=0x{:02X} length={}",
                self.kind().name(),
                self.status,
                self.data().len()
            )
        }
    }
}

fn fmt_meta<B: AsRef<[u8]>>(f: &mut fmt::Formatter<'_>, meta: &Meta<'_, B>) -> fmt::Result {
    use MetaKind::*;

    write!(f, "Meta: ({}) ", meta.meta_kind().name())?;
    match meta.meta_kind() {
        EndOfTrack => write!(f, "EndOfTrack"),
        Text | CopyrightNote | TrackName | InstrumentName | Lyric | Marker | CuePoint => {
            match meta.meta_value() {
                Ok(value) => write!(f, "{}", String::from_utf8_lossy(value)),
                Err(_) => write!(f, "<malformed>"),
            }
        }
        SetTempo => match meta.as_set_tempo().map(|t| t.tempo()) {
            Some(Ok(tempo)) => write!(f, "{}", tempo),
            _ => write!(f, "<malformed>"),
        },
        TimeSignature => match meta.as_time_signature() {
            Some(ts) => match (ts.numerator(), ts.denominator()) {
                (Ok(num), Ok(den)) => write!(f, "{}/{}", num, den),
                _ => write!(f, "<malformed>"),
            },
            None => write!(f, "<malformed>"),
        },
        KeySignature => match meta.as_key_signature().map(|k| k.name()) {
            Some(Ok(name)) => write!(f, "{}", name),
            _ => write!(f, "<malformed>"),
        },
        _ => {
            write!(f, "value={{")?;
            match meta.meta_value() {
                Ok(value) => {
                    for byte in value {
                        write!(f, " {:02x}", byte)?;
                    }
                }
                Err(_) => write!(f, " <malformed>")?,
            }
            write!(f, " }}")
        }
    }
}
