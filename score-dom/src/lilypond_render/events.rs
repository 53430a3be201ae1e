use fraction::Fraction;
use itertools::Itertools;
use log::warn;

use super::{RenderSettings, RendersToLilypond};
use crate::{
    error::{DomError, DomResult},
    notation::Attachment,
    primitives::{
        fraction_tools::{denom, numer},
        normalize_fraction, EventInfo, EventType, Grace, GraceType, Key,
        Length, Pitch,
    },
};

/// Written duration of the simple fraction: `8` for 1/8, `4.` for 3/8.
///
/// # Example
/// ```
/// # use fraction::Fraction;
/// # use score_dom::lilypond_render::fraction_to_length;
/// assert_eq!(fraction_to_length(Fraction::new(1u64, 8u64)).unwrap(), "8");
/// assert_eq!(fraction_to_length(Fraction::new(3u64, 2u64)).unwrap(), "1.");
/// let breve = fraction_to_length(Fraction::new(2u64, 1u64)).unwrap();
/// assert_eq!(breve, r"\breve");
/// assert!(fraction_to_length(Fraction::new(5u64, 8u64)).is_err());
/// assert!(fraction_to_length(Fraction::new(1u64, 3u64)).is_err());
/// ```
pub fn fraction_to_length(fraction: Fraction) -> DomResult<String> {
    let (num, den) = (numer(&fraction), denom(&fraction));
    if !den.is_power_of_two() {
        return Err(DomError::UnrepresentableLength(fraction));
    }
    match (num, den) {
        (1, den) => Ok(den.to_string()),
        (2, 1) => Ok(r"\breve".to_string()),
        (3, 1) => Ok(r"\breve.".to_string()),
        (4, 1) => Ok(r"\longa".to_string()),
        (6, 1) => Ok(r"\longa.".to_string()),
        (3, den) => Ok(format!("{}.", den / 2)),
        _ => Err(DomError::UnrepresentableLength(fraction)),
    }
}

/// Tie chain of written durations, from the longest to the shortest.
///
/// Tremolo subdivision is added to every token.
pub fn render_length(length: &Length) -> DomResult<Vec<String>> {
    normalize_fraction(length.get())
        .into_iter()
        .rev()
        .map(|part| {
            let duration = fraction_to_length(part)?;
            Ok(match length.trem_denom() {
                Some(trem) => format!("{duration}:{trem}"),
                None => duration,
            })
        })
        .collect()
}

/// `R1*5` for five bars of 4/4, `R1*7/8` for a bar of 7/8.
fn render_full_bar_rest(length: &Length) -> String {
    let bars = match length.bars() {
        1 => String::new(),
        n => format!("*{n}"),
    };
    match fraction_to_length(length.get()) {
        Ok(duration) => format!("R{duration}{bars}"),
        Err(_) => {
            let fraction = length.get();
            format!("R1*{}/{}{bars}", numer(&fraction), denom(&fraction))
        }
    }
}

/// Join tokens of a tie chain. The last token gets its own name, so
/// chords can carry ties of separate pitches.
fn chain(
    tokens: &[String],
    name: &str,
    last: &str,
    separator: &str,
    postfix: &str,
) -> String {
    tokens
        .iter()
        .enumerate()
        .map(|(idx, token)| {
            let name = match idx + 1 == tokens.len() {
                true => last,
                false => name,
            };
            let postfix = match idx {
                0 => postfix,
                _ => "",
            };
            format!("{name}{token}{postfix}")
        })
        .join(separator)
}

/// Renders events one by one, keeping the current key.
///
/// Key is updated by every [Attachment::KeySignature] on the way, so pitches
/// after it are spelled in the new key.
#[derive(Debug, Clone)]
pub struct Renderer {
    key: Key,
    octave_offset: i8,
}
impl Renderer {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            key: settings.key,
            octave_offset: settings.octave_offset,
        }
    }
    pub fn key(&self) -> &Key {
        &self.key
    }

    fn update_key(&mut self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Attachment::KeySignature(key) = attachment {
                self.key = *key;
            }
        }
    }

    fn pitch(&self, pitch: &Pitch) -> String {
        pitch.resolve(&self.key, self.octave_offset).render_lilypond()
    }

    pub fn render_events<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a EventInfo>,
    ) -> DomResult<String> {
        let mut rendered = Vec::new();
        for event in events {
            let event = self.render_event(event)?;
            if !event.is_empty() {
                rendered.push(event);
            }
        }
        Ok(rendered.join(" "))
    }

    fn render_grace(&mut self, grace: &Grace) -> DomResult<String> {
        let events = self.render_events(grace.events())?;
        Ok(format!(r"\{} {{ {events} }}", grace.grace_type.as_str()))
    }

    /// Items are separated by space, but bar check ends the line.
    fn render_prefix(&mut self, prefix: &[Attachment]) -> DomResult<String> {
        let mut rendered = String::new();
        for attachment in prefix {
            let item = match attachment {
                Attachment::Grace(grace)
                    if grace.grace_type != GraceType::AfterGrace =>
                {
                    self.render_grace(grace)?
                }
                attachment => attachment.render_lilypond(),
            };
            if item.is_empty() {
                continue;
            }
            rendered.push_str(&item);
            if !item.ends_with('\n') {
                rendered.push(' ');
            }
        }
        Ok(rendered)
    }

    fn render_postfix(postfix: &[Attachment]) -> String {
        postfix.iter().map(|a| a.render_lilypond()).join("")
    }

    pub fn render_event(&mut self, event: &EventInfo) -> DomResult<String> {
        self.update_key(&event.prefix);
        let prefix = self.render_prefix(&event.prefix)?;
        let postfix = Self::render_postfix(&event.postfix);
        if let EventType::Global = event.event {
            return Ok(format!("{prefix}{postfix}").trim_end().to_string());
        }
        if event.length.is_zero() {
            warn!("zero-length event is not rendered: {:?}", event);
            return Ok(String::new());
        }
        let body = match &event.event {
            EventType::Rest if event.length.is_full_bar() => {
                format!("{}{postfix}", render_full_bar_rest(&event.length))
            }
            EventType::Rest => {
                chain(&render_length(&event.length)?, "r", "r", " ", &postfix)
            }
            EventType::Spacer => {
                chain(&render_length(&event.length)?, "s", "s", " ", &postfix)
            }
            EventType::Note(pitch) => {
                let name = self.pitch(pitch);
                let tokens = render_length(&event.length)?;
                let mut rendered = chain(&tokens, &name, &name, "~ ", &postfix);
                if pitch.is_tied() {
                    rendered.push('~');
                }
                rendered
            }
            EventType::Chord(chord) => {
                let names: Vec<_> =
                    chord.pitches().iter().map(|p| self.pitch(p)).collect();
                let tied = chord
                    .pitches()
                    .iter()
                    .zip(names.iter())
                    .map(|(pitch, name)| match pitch.is_tied() {
                        true => format!("{name}~"),
                        false => name.clone(),
                    })
                    .join(" ");
                let name = format!("<{}>", names.join(" "));
                let last = format!("<{tied}>");
                let tokens = render_length(&event.length)?;
                chain(&tokens, &name, &last, "~ ", &postfix)
            }
            EventType::Tuplet(tuplet) => {
                let events =
                    self.render_events(tuplet.truncated_events().iter())?;
                format!(r"\tuplet {} {{ {events} }}{postfix}", tuplet.rate())
            }
            EventType::Global => String::new(),
        };
        let body = self.wrap_after_grace(&event.prefix, body)?;
        Ok(format!("{prefix}{body}"))
    }

    fn wrap_after_grace(
        &mut self,
        prefix: &[Attachment],
        body: String,
    ) -> DomResult<String> {
        let mut body = body;
        for attachment in prefix {
            if let Attachment::Grace(grace) = attachment {
                if grace.grace_type == GraceType::AfterGrace {
                    let events = self.render_events(grace.events())?;
                    body = format!(r"\afterGrace {{ {body} }} {{ {events} }}");
                }
            }
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use super::{fraction_to_length, render_length, Renderer};
    use crate::{
        error::DomError,
        lilypond_render::RenderSettings,
        notation::{Attachment, Direction},
        primitives::{
            Accidental, Chord, EventInfo, EventType, Grace, GraceType, Key,
            Length, NoteName, Pitch, Scale, TimeSignature, Tuplet,
        },
    };

    fn frac(num: u64, den: u64) -> Fraction {
        Fraction::new(num, den)
    }

    fn render(event: &EventInfo) -> String {
        Renderer::new(&RenderSettings::default())
            .render_event(event)
            .unwrap()
    }

    #[test]
    fn lengths() {
        assert_eq!(fraction_to_length(frac(1, 1)).unwrap(), "1");
        assert_eq!(fraction_to_length(frac(3, 8)).unwrap(), "4.");
        assert_eq!(fraction_to_length(frac(4, 1)).unwrap(), r"\longa");
        assert!(matches!(
            fraction_to_length(frac(7, 8)),
            Err(DomError::UnrepresentableLength(_))
        ));
        assert_eq!(
            render_length(&Length::from(frac(5, 8))).unwrap(),
            vec!["2", "8"]
        );
        assert_eq!(
            render_length(&Length::from(frac(15, 16))).unwrap(),
            vec!["2", "4", "8."]
        );
        let mut trem = Length::from(frac(1, 4));
        trem.set_trem_denom(Some(32));
        assert_eq!(render_length(&trem).unwrap(), vec!["4:32"]);
    }

    #[test]
    fn notes_and_rests() {
        let mut note =
            EventInfo::note(Length::from(frac(5, 8)), Pitch::from(60));
        assert_eq!(render(&note), "c'2~ c'8");
        note.set_tie(true);
        note.postfix.push(Attachment::Dynamics("mf".into()));
        assert_eq!(render(&note), r"c'2\mf~ c'8~");

        let rest = EventInfo::rest(Length::from(frac(5, 8)));
        assert_eq!(render(&rest), "r2 r8");
        let spacer = EventInfo::spacer(Length::from(frac(1, 16)));
        assert_eq!(render(&spacer), "s16");
        assert_eq!(render(&EventInfo::rest(Length::zero())), "");
    }

    #[test]
    fn full_bar_rests() {
        let mut rest =
            EventInfo::rest(Length::full_bar(&TimeSignature::new(4, 4)));
        rest.prefix.push(Attachment::BarCheck(3));
        assert_eq!(render(&rest), "| % bar 3\nR1");
        for _ in 0..4 {
            rest.length.add_bar();
        }
        assert_eq!(render(&rest), "| % bar 3\nR1*5");
        let rest = EventInfo::rest(Length::full_bar(&TimeSignature::new(7, 8)));
        assert_eq!(render(&rest), "R1*7/8");
        let rest = EventInfo::rest(Length::full_bar(&TimeSignature::new(3, 4)));
        assert_eq!(render(&rest), "R2.");
    }

    #[test]
    fn chords() {
        let mut chord = Chord::new(vec![Pitch::from(60), Pitch::from(64)]);
        chord.pitches_mut()[0].set_tie(true);
        let mut event =
            EventInfo::new(Length::from(frac(5, 8)), EventType::Chord(chord));
        event.postfix.push(Attachment::Articulation {
            articulation: ".".into(),
            direction: Direction::Up,
        });
        assert_eq!(render(&event), "<c' e'>2^.~ <c'~ e'>8");
    }

    #[test]
    fn tuplets() {
        let mut tuplet = EventInfo::new(
            Length::zero(),
            EventType::Tuplet(Tuplet::default()),
        );
        for midi in [60, 62, 64] {
            let third = Length::from(frac(1, 12));
            tuplet.append(EventInfo::note(third, Pitch::from(midi))).unwrap();
        }
        assert_eq!(render(&tuplet), r"\tuplet 3/2 { c'8 d'8 e'8 }");
    }

    #[test]
    fn graces() {
        let mut grace = Grace::new(GraceType::Acciaccatura);
        let quarter = Length::from(frac(1, 4));
        let sixteenth = Length::from(frac(1, 16));
        grace.append(EventInfo::note(sixteenth, Pitch::from(62)));
        let mut event = EventInfo::note(quarter.clone(), Pitch::from(60));
        event.prefix.push(Attachment::Grace(grace.clone()));
        assert_eq!(render(&event), r"\acciaccatura { d'16 } c'4");

        grace.grace_type = GraceType::AfterGrace;
        let mut event = EventInfo::note(quarter, Pitch::from(60));
        event.prefix.push(Attachment::Grace(grace));
        assert_eq!(render(&event), r"\afterGrace { c'4 } { d'16 }");
    }

    #[test]
    fn key_is_threaded() {
        let mut renderer = Renderer::new(&RenderSettings::default());
        let before = EventInfo::note(Length::from(frac(1, 4)), Pitch::from(63));
        let mut global = EventInfo::new(Length::zero(), EventType::Global);
        global.prefix.push(Attachment::KeySignature(Key::new(
            NoteName::E,
            Accidental::Flat,
            Scale::Major,
        )));
        let after = EventInfo::note(Length::from(frac(1, 4)), Pitch::from(63));
        let rendered = renderer
            .render_events([&before, &global, &after])
            .unwrap();
        assert_eq!(rendered, r"dis'4 \key es \major es'4");
        assert_eq!(renderer.key().tonic, (NoteName::E, Accidental::Flat));
    }
}
