use bouncer_core::{BodyKind, BodyView, FrameInfo, RenderSink};

/// Logs a one-line summary of the body set every `every` frames.
pub struct LogSink {
    every: u64,
    presented: u64,
    peak_bodies: usize,
}

impl LogSink {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            presented: 0,
            peak_bodies: 0,
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn peak_bodies(&self) -> usize {
        self.peak_bodies
    }
}

impl RenderSink for LogSink {
    fn present(&mut self, frame: &FrameInfo, bodies: &[BodyView]) {
        self.presented += 1;
        self.peak_bodies = self.peak_bodies.max(bodies.len());
        if frame.frame % self.every != 0 {
            return;
        }

        let fragments = bodies.iter().filter(|b| b.kind == BodyKind::Fragment).count();
        tracing::info!(
            "[frame] #{} t={:.2}s bodies={} blocks={} fragments={}",
            frame.frame,
            frame.time,
            bodies.len(),
            bodies.len() - fragments,
            fragments
        );
        if let Ok(json) = serde_json::to_string(bodies) {
            tracing::trace!("[frame] {}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bouncer_core::{Color, Shape};

    fn view(id: u32, kind: BodyKind) -> BodyView {
        BodyView {
            id,
            shape: Shape::Rectangle {
                width: 10.0,
                height: 10.0,
            },
            kind,
            position: [0.0, 0.0],
            size: [10.0, 10.0],
            color: Color::WHITE,
        }
    }

    #[test]
    fn test_tracks_peak_body_count() {
        let mut sink = LogSink::new(60);
        let info = FrameInfo { frame: 1, time: 0.1 };
        sink.present(&info, &[view(1, BodyKind::Block)]);
        sink.present(
            &info,
            &[view(1, BodyKind::Block), view(2, BodyKind::Fragment), view(3, BodyKind::Fragment)],
        );
        sink.present(&info, &[]);
        assert_eq!(sink.presented(), 3);
        assert_eq!(sink.peak_bodies(), 3);
    }
}
