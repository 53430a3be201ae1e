//! Variables and expressions of the score file.
use itertools::Itertools;

use super::{alphabet, normalize_name, RenderSettings, Renderer, TrackType};
use crate::{
    dom::{Staff, Voice},
    error::DomResult,
    lilypond_render::RendersToLilypond,
};

/// Piece of the score: variable definition and the expression, which uses
/// it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LilypondBlock {
    pub var: String,
    pub definition: String,
    pub expression: String,
}
impl LilypondBlock {
    pub fn new(
        var: impl Into<String>,
        definition: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            var: var.into(),
            definition: definition.into(),
            expression: expression.into(),
        }
    }
}

/// Voice variable with its music.
pub fn render_voice(
    voice: &Voice,
    settings: &RenderSettings,
    var: &str,
) -> DomResult<LilypondBlock> {
    let mut renderer = Renderer::new(settings);
    let events = renderer.render_events(voice.events().values())?;
    let (mode, command) = match settings.track_type.is_drums() {
        true => (
            r"\drummode ",
            match voice.voice_nr() {
                1 => String::new(),
                _ => r"\stemDown ".to_string(),
            },
        ),
        false => (
            "",
            voice
                .voice_str()
                .map(|nr| format!(r"\voice{nr} "))
                .unwrap_or_default(),
        ),
    };
    let definition = format!("{var} = {mode}{{\n  {command}{events}\n}}");
    Ok(LilypondBlock::new(var, definition, format!(r"\{var}")))
}

fn staff_params(voices: usize, track_type: TrackType) -> Vec<&'static str> {
    let mut params = Vec::new();
    if voices == 2 {
        params.push("printPartCombineTexts = ##f");
    }
    match track_type {
        TrackType::OneLinePerc => {
            params.push("drumStyleTable = #percussion-style");
            params.push(r"\override StaffSymbol.line-count = #1");
        }
        TrackType::Bongos => {
            params.push("drumStyleTable = #bongos-style");
            params.push(r"\override StaffSymbol.line-count = #2");
        }
        TrackType::Default | TrackType::Drums => (),
    }
    params
}

/// Staff variable, holding voices.
///
/// Two voices are combined by `\partCombine`, more are separated by `\\`.
pub fn render_staff(
    staff: &Staff,
    settings: &RenderSettings,
    var: &str,
) -> DomResult<LilypondBlock> {
    let mut voices = Vec::new();
    for voice in staff.voices() {
        let voice_var =
            format!("{var}Voice{}", alphabet(voice.voice_nr() as u32));
        voices.push(render_voice(voice, settings, &voice_var)?);
    }
    let music = match voices.as_slice() {
        [] => String::new(),
        [one] => one.expression.clone(),
        [first, second] => {
            format!(r"\partCombine {} {}", first.expression, second.expression)
        }
        many => {
            let music = many.iter().map(|v| &v.expression).join(r" \\ ");
            format!("<< {music} >>")
        }
    };
    let (context, clef) = match settings.track_type.is_drums() {
        true => ("DrumStaff", String::new()),
        false => ("Staff", format!("{} ", staff.clef().render_lilypond())),
    };
    let definitions = voices.iter().map(|v| &v.definition).join("\n");
    let definition = format!("{definitions}\n{var} = {{ {clef}{music} }}");

    let params = staff_params(voices.len(), settings.track_type);
    let with = match params.is_empty() {
        true => String::new(),
        false => format!(r" \with {{ {} }}", params.join(" ")),
    };
    let expression = format!(
        r#"\new {context} = "Staff{}"{with} \{var}"#,
        alphabet(staff.staff_nr() as u32)
    );
    Ok(LilypondBlock::new(var, definition, expression))
}

/// Part of one or more staves.
///
/// Single staff is rendered as is, several are grouped by the
/// [StaffGroup](super::StaffGroup) context.
pub fn render_part(
    name: &str,
    staves: &[Staff],
    settings: &RenderSettings,
) -> DomResult<LilypondBlock> {
    let var = match normalize_name(name) {
        name if name.is_empty() => "part".to_string(),
        name => name,
    };
    if let [staff] = staves {
        return render_staff(staff, settings, &var);
    }
    let mut blocks = Vec::new();
    for staff in staves {
        let staff_var =
            format!("{var}Staff{}", alphabet(staff.staff_nr() as u32));
        blocks.push(render_staff(staff, settings, &staff_var)?);
    }
    let definitions = blocks.iter().map(|b| &b.definition).join("\n");
    let expressions = blocks.iter().map(|b| &b.expression).join("\n  ");
    let definition = format!("{definitions}\n{var} = <<\n  {expressions}\n>>");
    let expression = format!(r"\new {} \{var}", settings.staff_group.as_str());
    Ok(LilypondBlock::new(var, definition, expression))
}

/// The whole file.
pub fn render_score(parts: &[LilypondBlock]) -> String {
    let definitions = parts.iter().map(|p| &p.definition).join("\n\n");
    let expressions = parts.iter().map(|p| &p.expression).join("\n    ");
    format!(
        r#"\version "2.24.0"

{definitions}

\score {{
  <<
    {expressions}
  >>
  \layout {{ }}
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fraction::Fraction;

    use super::{render_part, render_score, render_voice};
    use crate::{
        dom::{split_by_staff, EventsByPosition, GlobalEvents},
        lilypond_render::{RenderSettings, StaffGroup, TrackType},
        primitives::{
            EventInfo, Length, Pitch, Position, TimeMap, TimeSignature,
        },
    };

    fn staves(voices: &[(u8, u8)]) -> Vec<crate::dom::Staff> {
        let signatures = [TimeSignature::new(4, 4)];
        let tm = Arc::new(
            TimeMap::from_time_signatures(1, signatures, Fraction::from(0.0))
                .unwrap(),
        );
        let mut events = EventsByPosition::new();
        for (voice, staff) in voices {
            events
                .entry(Position::new(Fraction::from(0), &tm))
                .or_default()
                .push(
                    EventInfo::note(Length::from(1.0), Pitch::from(60))
                        .with_voice(*voice)
                        .with_staff(*staff),
                );
        }
        split_by_staff(events, &tm)
            .unwrap()
            .into_iter()
            .map(|mut s| {
                s.apply_global_events(&GlobalEvents::new());
                s.finalized().unwrap()
            })
            .collect()
    }

    #[test]
    fn voice() {
        let staves = staves(&[(1, 1), (2, 1)]);
        let settings = RenderSettings::default();
        let block =
            render_voice(&staves[0].voices()[1], &settings, "fluteVoiceB")
                .unwrap();
        assert_eq!(block.definition, "fluteVoiceB = {\n  \\voiceTwo c'1\n}");
        assert_eq!(block.expression, r"\fluteVoiceB");

        let settings = RenderSettings {
            track_type: TrackType::Drums,
            ..Default::default()
        };
        let block =
            render_voice(&staves[0].voices()[0], &settings, "drumsVoiceA")
                .unwrap();
        assert_eq!(block.definition, "drumsVoiceA = \\drummode {\n  c'1\n}");
    }

    #[test]
    fn single_staff_part() {
        let staves = staves(&[(1, 1), (2, 1)]);
        let settings = RenderSettings::default();
        let block = render_part("Flute 1", &staves, &settings).unwrap();
        assert_eq!(block.var, "FluteA");
        assert!(block.definition.ends_with(concat!(
            r"FluteA = { \clef treble ",
            r"\partCombine \FluteAVoiceA \FluteAVoiceB }"
        )));
        assert_eq!(
            block.expression,
            concat!(
                r#"\new Staff = "StaffA" "#,
                r"\with { printPartCombineTexts = ##f } \FluteA"
            )
        );
    }

    #[test]
    fn grand_staff() {
        let staves = staves(&[(1, 1), (1, 2)]);
        let settings = RenderSettings {
            staff_group: StaffGroup::PianoStaff,
            ..Default::default()
        };
        let block = render_part("piano", &staves, &settings).unwrap();
        assert_eq!(block.expression, r"\new PianoStaff \piano");
        assert!(block
            .definition
            .contains(r"pianoStaffB = { \clef bass \pianoStaffBVoiceA }"));
        assert!(block
            .definition
            .contains(r#"\new Staff = "StaffB" \pianoStaffB"#));

        let score = render_score(&[block]);
        assert!(score.starts_with("\\version \"2.24.0\"\n"));
        assert!(score.contains(
            "\\score {\n  <<\n    \\new PianoStaff \\piano\n  >>"
        ));
    }
}
