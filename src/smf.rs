//! The SMF packaging: header chunk, track chunk scanning, and whole-file
//! decode/encode.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::message::SmallBytes;
use crate::primitive::{read_msb, read_slice};
use crate::track::{Track, TrackView};

/// Size of the `MThd` chunk, id and length fields included.
pub const HEADER_LEN: usize = 14;

/// How many bytes a file body must have before track materialization is
/// spread over multiple threads.
#[cfg(feature = "parallel")]
const PARALLEL_ENABLE_THRESHOLD: usize = 3 * 1024;

/// How the tracks of a file relate to each other.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// One track carrying all channels.
    SingleTrack,
    /// Several tracks played simultaneously.
    MultiTrack,
    /// Several tracks, each an independent song.
    MultiSong,
}

impl Format {
    pub fn from_bits(bits: u16) -> Result<Format> {
        Ok(match bits {
            0 => Format::SingleTrack,
            1 => Format::MultiTrack,
            2 => Format::MultiSong,
            _ => return Err(Error::InvalidHeader("format must be 0, 1 or 2")),
        })
    }

    pub fn as_bits(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::MultiTrack => 1,
            Format::MultiSong => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::SingleTrack => "SingleTrack",
            Format::MultiTrack => "MultiTrack",
            Format::MultiSong => "MultiSong",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The 16-bit division word of the header: either ticks per quarter note,
/// or an SMPTE frame rate paired with ticks per frame.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Division {
    /// Ticks per quarter note, 15 bits.
    TicksPerQuarter(u16),
    /// SMPTE timing: a negated 7-bit frame rate and ticks per frame.
    Smpte {
        negative_smpte: u8,
        ticks_per_frame: u8,
    },
}

impl Division {
    pub fn from_bits(bits: u16) -> Division {
        if bits & 0x8000 != 0 {
            Division::Smpte {
                negative_smpte: (bits >> 8) as u8 & 0x7F,
                ticks_per_frame: bits as u8,
            }
        } else {
            Division::TicksPerQuarter(bits)
        }
    }

    pub fn as_bits(self) -> u16 {
        match self {
            Division::TicksPerQuarter(ticks) => ticks & 0x7FFF,
            Division::Smpte {
                negative_smpte,
                ticks_per_frame,
            } => 0x8000 | (u16::from(negative_smpte) << 8) | u16::from(ticks_per_frame),
        }
    }

    /// Ticks per quarter note, or `None` for SMPTE timing.
    pub fn ticks_per_quarter(self) -> Option<u16> {
        match self {
            Division::TicksPerQuarter(ticks) => Some(ticks),
            Division::Smpte { .. } => None,
        }
    }

    /// The SMPTE frame rate, or `None` for metrical timing.
    pub fn frames_per_second(self) -> Option<u16> {
        match self {
            Division::TicksPerQuarter(_) => None,
            Division::Smpte { negative_smpte, .. } => {
                Some(u16::from(!negative_smpte.wrapping_sub(1) & 0x3F))
            }
        }
    }

    /// Ticks per second, or `None` for metrical timing.
    pub fn ticks_per_second(self) -> Option<u32> {
        match self {
            Division::TicksPerQuarter(_) => None,
            Division::Smpte {
                ticks_per_frame, ..
            } => self
                .frames_per_second()
                .map(|fps| u32::from(fps) * u32::from(ticks_per_frame)),
        }
    }
}

/// The contents of the `MThd` chunk, minus the track count (which the
/// owning file derives from its track list).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Header {
    pub format: Format,
    pub division: Division,
}

impl Header {
    pub fn new(format: Format, division: Division) -> Header {
        Header { format, division }
    }

    /// Decode the 14-byte `MThd` chunk, returning the header and the
    /// declared track count.
    fn read(raw: &[u8]) -> Result<(Header, u16)> {
        if raw.len() < HEADER_LEN {
            return Err(Error::InvalidHeader(
                "file is shorter than the 14-byte header",
            ));
        }
        let mut cursor = raw;
        let id = read_slice(&mut cursor, 4)?;
        match id {
            b"MThd" => {}
            _ => return Err(Error::InvalidHeader("missing MThd chunk id")),
        }
        if read_msb(&mut cursor, 4)? != 6 {
            return Err(Error::InvalidHeader("MThd chunk length must be 6"));
        }
        let format = Format::from_bits(read_msb(&mut cursor, 2)? as u16)?;
        let track_count = read_msb(&mut cursor, 2)? as u16;
        let division = Division::from_bits(read_msb(&mut cursor, 2)? as u16);
        Ok((Header::new(format, division), track_count))
    }

    fn encode(&self, track_count: u16) -> [u8; HEADER_LEN] {
        let mut bytes = [0; HEADER_LEN];
        bytes[0..4].copy_from_slice(b"MThd");
        bytes[4..8].copy_from_slice(&6u32.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.format.as_bits().to_be_bytes());
        bytes[10..12].copy_from_slice(&track_count.to_be_bytes());
        bytes[12..14].copy_from_slice(&self.division.as_bits().to_be_bytes());
        bytes
    }
}

/// Iterator over the `MTrk` chunk bodies of a file.
///
/// Chunks with an unrecognized id are skipped silently, re-validating
/// bounds at each skip. The iterator ends at the declared track count or
/// when the buffer runs out, whichever comes first; missing tracks are not
/// fabricated.
#[derive(Clone, Debug)]
pub struct TrackChunkIter<'a> {
    raw: &'a [u8],
    remaining: u16,
}

impl<'a> TrackChunkIter<'a> {
    fn read_chunk(&mut self) -> Result<Option<TrackView<'a>>> {
        loop {
            if self.raw.is_empty() {
                return Ok(None);
            }
            let id = read_slice(&mut self.raw, 4)?;
            let len = read_msb(&mut self.raw, 4)? as usize;
            let body = read_slice(&mut self.raw, len)?;
            match id {
                b"MTrk" => return Ok(Some(TrackView::new(body))),
                // Unknown chunk: skip its body and keep scanning.
                _ => {}
            }
        }
    }
}

impl<'a> Iterator for TrackChunkIter<'a> {
    type Item = Result<TrackView<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(view)) => {
                self.remaining -= 1;
                Some(Ok(view))
            }
            Ok(None) => None,
            Err(err) => {
                self.raw = &[];
                Some(Err(err))
            }
        }
    }
}

/// A lazily parsed SMF file: the decoded header plus an iterator factory
/// over borrowed track chunk bodies.
#[derive(Copy, Clone, Debug)]
pub struct MidiFileView<'a> {
    pub header: Header,
    track_count: u16,
    body: &'a [u8],
}

impl<'a> MidiFileView<'a> {
    /// Decode the header and locate the chunk area. Track bodies are not
    /// touched until iterated.
    pub fn parse(raw: &'a [u8]) -> Result<MidiFileView<'a>> {
        let (header, track_count) = Header::read(raw)?;
        Ok(MidiFileView {
            header,
            track_count,
            body: &raw[HEADER_LEN..],
        })
    }

    /// The track count declared in the header. The actual number of chunks
    /// in a malformed file may be smaller.
    pub fn track_count(&self) -> u16 {
        self.track_count
    }

    /// Iterate over the track chunks of the file.
    pub fn tracks(&self) -> TrackChunkIter<'a> {
        TrackChunkIter {
            raw: self.body,
            remaining: self.track_count,
        }
    }
}

/// An owning, fully materialized SMF file.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct MidiFile<B = SmallBytes> {
    pub header: Header,
    pub tracks: Vec<Track<B>>,
}

impl<B> MidiFile<B> {
    pub fn new(header: Header, tracks: Vec<Track<B>>) -> MidiFile<B> {
        MidiFile { header, tracks }
    }
}

impl<B: FromIterator<u8> + Send> MidiFile<B> {
    /// Decode a complete SMF byte buffer into owning tracks.
    pub fn parse(raw: &[u8]) -> Result<MidiFile<B>> {
        Self::from_view(&MidiFileView::parse(raw)?)
    }

    /// Materialize a lazy view, copying every payload out of the backing
    /// buffer.
    pub fn from_view(view: &MidiFileView<'_>) -> Result<MidiFile<B>> {
        Ok(MidiFile {
            header: view.header,
            tracks: collect_tracks(view)?,
        })
    }

    /// Read and decode the file at `path` in one shot.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<MidiFile<B>> {
        let bytes = fs::read(path)?;
        Self::parse(&bytes)
    }
}

fn collect_tracks<B: FromIterator<u8> + Send>(view: &MidiFileView<'_>) -> Result<Vec<Track<B>>> {
    #[cfg(feature = "parallel")]
    {
        if view.body.len() >= PARALLEL_ENABLE_THRESHOLD {
            use rayon::prelude::*;

            let views = view.tracks().collect::<Result<Vec<_>>>()?;
            return views.into_par_iter().map(Track::from_view).collect();
        }
    }
    let mut tracks = Vec::with_capacity(view.track_count as usize);
    for track_view in view.tracks() {
        tracks.push(Track::from_view(track_view?)?);
    }
    Ok(tracks)
}

impl<B: AsRef<[u8]>> MidiFile<B> {
    /// Encode the file back into SMF bytes.
    ///
    /// Each track is stably sorted by time, running-status compression is
    /// reapplied, and exactly one `EndOfTrack` terminates each chunk. The
    /// track count is derived from the track list.
    pub fn to_bytes(&self) -> Vec<u8> {
        let events: usize = self.tracks.iter().map(|t| t.len() * 5 + 16).sum();
        let mut out = Vec::with_capacity(32 + events);
        out.extend_from_slice(&self.header.encode(self.tracks.len() as u16));
        for track in &self.tracks {
            track.encode_into(&mut out);
        }
        out
    }

    /// Encode and write the file to `path` in one shot.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

impl<B: AsRef<[u8]>> fmt::Display for MidiFile<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "format: {}", self.header.format)?;
        match self.header.division {
            Division::TicksPerQuarter(ticks) => {
                writeln!(f, "division: {} ticks/quarter", ticks)?;
            }
            Division::Smpte { .. } => {
                writeln!(
                    f,
                    "division: {} ticks/second",
                    self.header.division.ticks_per_second().unwrap_or(0)
                )?;
            }
        }
        for (i, track) in self.tracks.iter().enumerate() {
            writeln!(f, "track {}:", i)?;
            write!(f, "{}", track)?;
        }
        Ok(())
    }
}
