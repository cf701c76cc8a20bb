//! Track-level parsing and encoding.
//!
//! A track chunk body is decoded by [`EventIter`], a pull parser that keeps
//! the MIDI running-status state across events. [`TrackView`] hands out such
//! iterators over a borrowed chunk body without allocating; [`Track`] is the
//! materialized, owning form.

use std::fmt;

use crate::error::{Error, Result};
use crate::message::{Message, MessageKind, MetaKind, SmallBytes};
use crate::primitive::{eof, read_slice, read_vlq, write_vlq};

/// A pull parser over the body of a single `MTrk` chunk.
///
/// Yields one message per step, tracking running status. The iterator is
/// single-pass and stops at the first `EndOfTrack` meta (which is consumed
/// but not yielded), at the end of the chunk body, or at the first error.
#[derive(Clone, Debug)]
pub struct EventIter<'a> {
    raw: &'a [u8],
    tick: u32,
    prev_status: u8,
    /// Total wire length of the previous status-carrying event, status byte
    /// included. Zero until the first such event has been read.
    prev_event_len: usize,
    reached_end: bool,
}

impl<'a> EventIter<'a> {
    /// Start parsing a track chunk body.
    pub fn new(raw: &'a [u8]) -> EventIter<'a> {
        EventIter {
            raw,
            tick: 0,
            prev_status: 0x00,
            prev_event_len: 0,
            reached_end: false,
        }
    }

    /// Whether an explicit `EndOfTrack` meta terminated the track.
    /// A chunk body is also allowed to simply run out of bytes.
    pub fn reached_end_of_track(&self) -> bool {
        self.reached_end
    }

    /// The bytes not yet parsed.
    pub fn unread(&self) -> &'a [u8] {
        self.raw
    }

    fn read_event(&mut self) -> Result<Option<Message<&'a [u8]>>> {
        let delta = read_vlq(&mut self.raw)?;
        self.tick = self.tick.wrapping_add(delta);
        let status = *self.raw.first().ok_or_else(|| eof(0, 1))?;
        match status {
            0xF0 | 0xF7 => self.sysex_event(status).map(Some),
            0xFF => self.meta_event(),
            s if s < 0x80 => self.running_status_event().map(Some),
            s => self.fixed_event(s).map(Some),
        }
    }

    /// A data byte in status position: reuse the previous status and length.
    fn running_status_event(&mut self) -> Result<Message<&'a [u8]>> {
        if self.prev_event_len == 0 {
            return Err(Error::Corrupted(
                "running status byte with no preceding status",
            ));
        }
        let data = read_slice(&mut self.raw, self.prev_event_len - 1)?;
        Ok(Message::new(self.tick, self.prev_status, data))
    }

    /// A SysEx start (`0xF0`) or continuation (`0xF7`) event. The payload is
    /// the VLQ length followed by that many content bytes; a terminating
    /// `0xF7` on the wire counts toward the length and is not stripped.
    fn sysex_event(&mut self, status: u8) -> Result<Message<&'a [u8]>> {
        let mut cursor = &self.raw[1..];
        let len = read_vlq(&mut cursor)?;
        let vlq_len = self.raw.len() - 1 - cursor.len();
        let event_len = 1 + vlq_len + len as usize;
        self.prev_status = status;
        self.prev_event_len = event_len;
        let event = read_slice(&mut self.raw, event_len)?;
        Ok(Message::new(self.tick, status, &event[1..]))
    }

    /// A meta event. Does not affect running status. The payload is the
    /// meta-type byte, the VLQ length and the value bytes. `EndOfTrack`
    /// consumes the rest of the chunk and is not yielded.
    fn meta_event(&mut self) -> Result<Option<Message<&'a [u8]>>> {
        let remainder = &self.raw[1..];
        let meta_type = *remainder.first().ok_or_else(|| eof(0, 1))?;
        let mut cursor = &remainder[1..];
        let len = read_vlq(&mut cursor)?;
        let vlq_len = remainder.len() - 1 - cursor.len();
        let event_len = 2 + vlq_len + len as usize;
        if event_len > self.raw.len() {
            return Err(eof(self.raw.len(), event_len));
        }
        if MetaKind::from_status(meta_type) == MetaKind::EndOfTrack {
            // The chunk is over regardless of any bytes left behind it.
            self.raw = &[];
            self.reached_end = true;
            return Ok(None);
        }
        let event = read_slice(&mut self.raw, event_len)?;
        Ok(Some(Message::new(self.tick, 0xFF, &event[1..])))
    }

    /// A voice or system-common event with a table-driven fixed length.
    fn fixed_event(&mut self, status: u8) -> Result<Message<&'a [u8]>> {
        let kind = MessageKind::from_status(status);
        let len = kind
            .fixed_len()
            .ok_or(Error::Corrupted("status byte with undeterminable length"))?;
        self.prev_status = status;
        self.prev_event_len = len;
        let event = read_slice(&mut self.raw, len)?;
        Ok(Message::new(self.tick, status, &event[1..]))
    }
}

impl<'a> Iterator for EventIter<'a> {
    type Item = Result<Message<&'a [u8]>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reached_end || self.raw.is_empty() {
            return None;
        }
        match self.read_event() {
            Ok(Some(msg)) => Some(Ok(msg)),
            Ok(None) => None,
            Err(err) => {
                // Never read again from the middle of a malformed event.
                self.raw = &[];
                Some(Err(err))
            }
        }
    }
}

/// A non-owning track: a borrowed `MTrk` chunk body that can be iterated.
///
/// The backing buffer must stay alive and unchanged for as long as the view
/// or any iterator derived from it is in use; the borrow checker enforces
/// this.
#[derive(Copy, Clone, Debug)]
pub struct TrackView<'a> {
    raw: &'a [u8],
}

impl<'a> TrackView<'a> {
    /// Wrap a track chunk body (the bytes between the 8-byte `MTrk` header
    /// and the end of the chunk).
    pub fn new(raw: &'a [u8]) -> TrackView<'a> {
        TrackView { raw }
    }

    /// The raw chunk body.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.raw
    }

    /// Iterate over the messages of this track, decoding lazily.
    pub fn iter(&self) -> EventIter<'a> {
        EventIter::new(self.raw)
    }
}

impl<'a> IntoIterator for TrackView<'a> {
    type Item = Result<Message<&'a [u8]>>;
    type IntoIter = EventIter<'a>;

    fn into_iter(self) -> EventIter<'a> {
        EventIter::new(self.raw)
    }
}

/// An owning track: an ordered sequence of messages.
///
/// Messages are kept in the order the parser emitted them (their byte
/// order), which is not necessarily sorted by time; the encoder sorts.
#[derive(Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct Track<B = SmallBytes> {
    pub messages: Vec<Message<B>>,
}

impl<B> Track<B> {
    pub fn new(messages: Vec<Message<B>>) -> Track<B> {
        Track { messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the messages are already ordered by time.
    pub fn is_sorted(&self) -> bool {
        self.messages.windows(2).all(|w| w[0].time <= w[1].time)
    }
}

impl<B: FromIterator<u8>> Track<B> {
    /// Materialize a view by draining its iterator, copying every payload
    /// into the owning container.
    pub fn from_view(view: TrackView<'_>) -> Result<Track<B>> {
        // Real-world tracks average a little over 3 bytes per event.
        let mut messages = Vec::with_capacity(view.as_bytes().len() / 3 + 100);
        for msg in view.iter() {
            messages.push(msg?.into_owned());
        }
        Ok(Track { messages })
    }
}

impl<B: AsRef<[u8]> + Clone> Track<B> {
    /// A stably time-sorted copy of this track, with any `EndOfTrack`
    /// messages dropped so the encoder can append exactly one. Ties keep
    /// their insertion order. Returns a plain copy when there is nothing to
    /// do.
    pub fn sorted(&self) -> Track<B> {
        if self.is_sorted() && !self.messages.iter().any(|m| m.is_end_of_track()) {
            return self.clone();
        }
        let mut messages: Vec<Message<B>> = self
            .messages
            .iter()
            .filter(|m| !m.is_end_of_track())
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.time);
        Track { messages }
    }
}

impl<B: AsRef<[u8]>> Track<B> {
    /// Append this track to `out` as a complete `MTrk` chunk: messages
    /// stably sorted by time, running-status compression applied, and a
    /// synthetic `EndOfTrack` terminating the chunk.
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        let chunk_start = out.len();
        out.extend_from_slice(b"MTrk\0\0\0\0");

        // (time, index) pairs; the index keeps simultaneous messages in
        // insertion order. Any EndOfTrack present in memory is dropped here
        // and reinserted below.
        let mut order: Vec<(u32, usize)> = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_end_of_track())
            .map(|(i, m)| (m.time, i))
            .collect();
        if !order.windows(2).all(|w| w[0] <= w[1]) {
            order.sort_unstable();
        }

        let mut prev_time = 0u32;
        let mut prev_status = 0x00u8;
        for &(time, index) in &order {
            let msg = &self.messages[index];
            write_vlq(out, time - prev_time);
            prev_time = time;
            // Meta and SysEx never take part in running status.
            let status = msg.status;
            if status == 0xFF || status == 0xF0 || status == 0xF7 || status != prev_status {
                out.push(status);
            }
            out.extend_from_slice(msg.data());
            prev_status = status;
        }

        out.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let body_len = (out.len() - chunk_start - 8) as u32;
        out[chunk_start + 4..chunk_start + 8].copy_from_slice(&body_len.to_be_bytes());
    }

    /// Encode this track as a standalone `MTrk` chunk.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.messages.len() * 5 + 16 + 8);
        self.encode_into(&mut out);
        out
    }
}

impl<B: AsRef<[u8]>> fmt::Display for Track<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for msg in &self.messages {
            writeln!(f, "{}", msg)?;
        }
        Ok(())
    }
}
