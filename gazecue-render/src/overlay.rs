use gazecue_core::{Coded, Participant, Trial};

/// Text lines of the trial-debugging overlay, top to bottom.
///
/// `previous` is the last concluded trial; its recorded answer is shown so
/// responses can be checked while the run is going.
pub fn debug_lines(
    participant: &Participant,
    progress: Option<(usize, usize)>,
    trial: Option<&Trial>,
    previous: Option<&Trial>,
) -> Vec<String> {
    let mut lines: Vec<String> = participant
        .fields()
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();

    match progress {
        Some((current, total)) => {
            let percent = current as f32 * 100.0 / total.max(1) as f32;
            lines.push(format!("Trial {current} / {total} ({percent:.0}%)"));
        }
        None => lines.push("Trial -".to_string()),
    }

    if let Some(t) = trial {
        push_trial(&mut lines, t);
    }
    if let Some(t) = previous {
        lines.push("Previous trial".to_string());
        push_trial(&mut lines, t);
        lines.push(format!(
            "{} RT {} ms {}",
            t.response().label(),
            t.reaction_time_ms().unwrap_or_default(),
            if t.response_accuracy() { "CORRECT" } else { "INCORRECT" }
        ));
    }
    lines
}

fn push_trial(lines: &mut Vec<String>, t: &Trial) {
    lines.push(format!(
        "{} {} #{}",
        t.stimulus.species.label(),
        t.stimulus.gaze_direction.label(),
        t.stimulus.number
    ));
    lines.push(format!(
        "{} {} SOA {} ms {}",
        t.target.letter.label(),
        t.target.side.label(),
        t.stimulus_onset_async_ms,
        t.gaze_validity().label()
    ));
}
