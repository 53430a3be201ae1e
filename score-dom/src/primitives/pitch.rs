pub use musical_note::{
    midi_to_note, Accidental, Key, NoteName, Octave, ResolvedNote, Scale,
};

use musical_note::NotesMap;
use once_cell::sync::OnceCell;

use crate::lilypond_render::RendersToLilypond;

const LETTERS: [NoteName; 7] = [
    NoteName::C,
    NoteName::D,
    NoteName::E,
    NoteName::F,
    NoteName::G,
    NoteName::A,
    NoteName::B,
];

static NOTES_MAP: OnceCell<&'static NotesMap> = OnceCell::new();

/// NotesMap initializes itself lazily and fails, if two threads do it at
/// once, so the first access is serialized here.
fn notes_map() -> &'static NotesMap {
    NOTES_MAP.get_or_init(NotesMap::get)
}

fn next_letter(note: NoteName) -> NoteName {
    let idx = LETTERS.iter().position(|n| *n == note).unwrap_or(0);
    LETTERS[(idx + 1) % 7]
}

/// Degrees of the key as midi notes (0..12) and their spelling.
///
/// None if some degree can not be written with two accidentals at most.
fn degrees(key: &Key) -> Option<[(u8, (NoteName, Accidental)); 7]> {
    let notes = notes_map();
    let mut midi = key.get_root()[0];
    let mut degrees = [(midi, key.tonic); 7];
    for (idx, interval) in key.scale.structure().iter().enumerate() {
        midi = (midi + interval) % 12;
        let letter = next_letter(degrees[idx].1 .0);
        let note =
            notes.resolve_note_for_midi((letter, Accidental::White), midi)?;
        degrees[idx + 1] = (midi, note);
    }
    Some(degrees)
}

/// Accidental, which midi_to_note needs to spell the note without
/// panicking.
///
/// musical-note resolves notes outside of the scale by the last accidental
/// of the key signature. In keys without accidentals (and in some keys
/// with double ones) black keys have no such spelling.
fn spelling_hint(
    midi: u8,
    key: &Key,
    accidental: Option<Accidental>,
) -> Option<Accidental> {
    let notes = notes_map();
    let spellings = notes.get_by_midi(&midi);
    if let Some(accidental) =
        accidental.filter(|acc| spellings.contains_key(acc))
    {
        return Some(accidental);
    }
    let class = midi % 12;
    let default = match spellings.contains_key(&Accidental::White) {
        true => Accidental::White,
        false => Accidental::Sharp,
    };
    let degrees = match degrees(key) {
        Some(degrees) => degrees,
        None => return Some(default),
    };
    let degree_midi = degrees.map(|(midi, _)| midi);
    let in_scale = degrees.iter().find(|(midi, _)| *midi == class);
    if degree_midi.binary_search(&class).is_ok() {
        return None;
    }
    let root = degree_midi[0];
    let altered = match key.scale {
        Scale::Minor if class == root + 1 => Some(degrees[1].1),
        Scale::Major if class == (root + 8) % 12 => Some(degrees[5].1),
        _ => None,
    };
    if let Some(degree) = altered {
        return match notes.resolve_note_for_midi(degree, class) {
            Some(_) => None,
            None => Some(default),
        };
    }
    let signature = degrees[1..]
        .iter()
        .map(|(_, (_, acc))| *acc)
        .filter(|acc| *acc != Accidental::White)
        .last();
    let fallback = signature
        .filter(|acc| spellings.contains_key(acc))
        .unwrap_or(Accidental::White);
    match spellings.contains_key(&fallback) {
        true => None,
        false => Some(in_scale.map(|(_, (_, acc))| *acc).unwrap_or(default)),
    }
}

/// Spell midi pitch in the key.
///
/// Explicit accidental wins, if the pitch can be written with it.
///
/// ```
/// use score_dom::lilypond_render::RendersToLilypond;
/// use score_dom::primitives::{spell, Key, Scale};
///
/// let d_minor = Key::from_str("d", Scale::Minor).unwrap();
/// let a_major = Key::from_str("a", Scale::Major).unwrap();
/// assert_eq!(spell(58, &d_minor, None).render_lilypond(), "bes");
/// assert_eq!(spell(58, &a_major, None).render_lilypond(), "ais");
/// assert_eq!(spell(61, &Key::default(), None).render_lilypond(), "cis'");
/// ```
pub fn spell(
    midi: u8,
    key: &Key,
    accidental: Option<Accidental>,
) -> ResolvedNote {
    let hint = spelling_hint(midi, key, accidental);
    midi_to_note(midi, *key, hint)
}

fn accidental_suffix(note: NoteName, accidental: Accidental) -> String {
    match accidental {
        Accidental::White => String::new(),
        acc => acc.to_string_by_note(note),
    }
}

impl RendersToLilypond for ResolvedNote {
    /// Absolute pitch: `c` is midi 48, `c'` is midi 60.
    fn render_lilypond(&self) -> String {
        // octave follows the sounding midi, so b♯ and c♭ are moved
        // to the octave of their letter
        let mut octave = self.octave.raw() as i8;
        match (self.note, self.accidental) {
            (NoteName::B, Accidental::Sharp | Accidental::DoubleSharp) => {
                octave -= 1
            }
            (NoteName::C, Accidental::Flat | Accidental::DoubleFlat) => {
                octave += 1
            }
            _ => (),
        }
        let marks = match octave - 4 {
            x if x > 0 => "'".repeat(x as usize),
            x if x < 0 => ",".repeat(-x as usize),
            _ => String::new(),
        };
        format!(
            "{}{}{}",
            self.note.to_string(),
            accidental_suffix(self.note, self.accidental),
            marks
        )
    }
}

impl RendersToLilypond for Key {
    fn render_lilypond(&self) -> String {
        let (note, accidental) = self.tonic;
        let mode = match self.scale {
            Scale::Mixolidyan => "mixolydian".to_string(),
            scale => scale.to_string(),
        };
        format!(
            r"\key {}{} \{}",
            note.to_string(),
            accidental_suffix(note, accidental),
            mode
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ResolvedPitch {
    /// Literal name, rendered as is.
    Name(String),
    Note(ResolvedNote),
}
impl RendersToLilypond for ResolvedPitch {
    fn render_lilypond(&self) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Note(note) => note.render_lilypond(),
        }
    }
}

/// Sounding pitch of the note.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pitch {
    midi: u8,
    accidental: Option<Accidental>,
    tie: bool,
    note_name: Option<String>,
}
impl Pitch {
    /// note_name is used instead of the spelled pitch, e.g. for drums.
    pub fn from_midi(
        midi: u8,
        accidental: Option<Accidental>,
        note_name: Option<String>,
    ) -> Self {
        Self {
            midi,
            accidental,
            tie: false,
            note_name,
        }
    }
    pub fn midi(&self) -> u8 {
        self.midi
    }
    pub fn accidental(&self) -> Option<Accidental> {
        self.accidental
    }
    pub fn set_accidental(&mut self, accidental: Option<Accidental>) {
        self.accidental = accidental;
    }
    pub fn note_name(&self) -> Option<&str> {
        self.note_name.as_deref()
    }
    pub fn set_note_name(&mut self, note_name: Option<String>) {
        self.note_name = note_name;
    }
    pub fn is_tied(&self) -> bool {
        self.tie
    }
    pub fn set_tie(&mut self, tie: bool) {
        self.tie = tie;
    }

    /// Spell pitch in the key, moved by whole octaves.
    pub fn resolve(&self, key: &Key, octave_offset: i8) -> ResolvedPitch {
        match &self.note_name {
            Some(name) => ResolvedPitch::Name(name.to_string()),
            None => {
                let midi = (self.midi as i16 + octave_offset as i16 * 12)
                    .clamp(0, 127) as u8;
                ResolvedPitch::Note(spell(midi, key, self.accidental))
            }
        }
    }
}
impl From<u8> for Pitch {
    fn from(midi: u8) -> Self {
        Self::from_midi(midi, None, None)
    }
}
