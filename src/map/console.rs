use std::time::Duration;

use super::{MapHandle, MarkerStyle};
use crate::geo::Coordinate;

/// 终端地图：把相机与标记命令打印为进度行
#[derive(Debug, Default, Clone)]
pub struct ConsoleMap {
    verbose: bool,
}

impl ConsoleMap {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl MapHandle for ConsoleMap {
    fn fly_to(&self, target: Coordinate, zoom: f64, duration: Duration) {
        if self.verbose {
            println!(
                "   🛰️  flyTo {} zoom {:.1} ({}ms)",
                target,
                zoom,
                duration.as_millis()
            );
        }
    }

    fn place_marker(&self, at: Coordinate, style: MarkerStyle) {
        if self.verbose {
            println!("   📍 marker {:?} at {}", style, at);
        }
    }

    fn remove_marker(&self) {
        if self.verbose {
            println!("   📍 marker removed");
        }
    }

    fn set_popup(&self, _at: Coordinate, html: &str) {
        println!("   {}", strip_tags(html));
    }

    fn remove_popup(&self) {}
}

fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
