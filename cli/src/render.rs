//! Text rendering of the replica for terminal output.

use replica::{ConnectionStatus, LocalElement, Renderer};

/// One line per element: id, kind, geometry, effect, source.
pub fn describe(el: &LocalElement) -> String {
    let record = &el.record;
    let mut line = format!(
        "{id}\t{kind}\t({x}, {y})\t{w}x{h}\tfilter: {effect}",
        id = record.id,
        kind = record.kind,
        x = record.x,
        y = record.y,
        w = record.width,
        h = record.height,
        effect = el.effect,
    );
    if let Some(source) = &record.source {
        line.push('\t');
        line.push_str(source);
    }
    line
}

/// Prints every change the replica makes, for `stage watch`.
#[derive(Debug, Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn mount(&mut self, element: &LocalElement) {
        println!("+ {}", describe(element));
    }

    fn update(&mut self, element: &LocalElement) {
        println!("~ {}", describe(element));
    }

    fn unmount(&mut self, id: &str) {
        println!("- {id}");
    }

    fn clear(&mut self) {
        println!("= snapshot");
    }

    fn presence(&mut self, peers: &[String]) {
        println!("@ peers: {}", peers.len());
    }

    fn connection(&mut self, status: ConnectionStatus) {
        eprintln!("[{status:?}]");
    }
}
