#![allow(dead_code)]

use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct TestClipConfig {
    pub width: usize,
    pub height: usize,
    pub format: &'static str, // e.g., "vs.GRAY8"
    pub length: usize,
    pub content_type: ClipContentType,
    /// `BlankClip` colors for the background and the foreground pattern
    pub colors: (&'static str, &'static str),
}

impl TestClipConfig {
    pub fn gray8(width: usize, height: usize, length: usize, content_type: ClipContentType) -> Self {
        Self {
            width,
            height,
            format: "vs.GRAY8",
            length,
            content_type,
            colors: ("[0]", "[255]"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ClipContentType {
    Blank,
    /// A square drifting by the given number of pixels per frame
    MovingBox { speed_x: usize, speed_y: usize },
}

impl ClipContentType {
    fn to_script(self, colors: (&str, &str)) -> String {
        match self {
            Self::Blank => String::new(),
            Self::MovingBox { speed_x, speed_y } => {
                let (background, foreground) = colors;
                format!(
                    r#"
box_size = min(clip.width, clip.height) // 4
base = core.std.BlankClip(clip, color={background})
box = core.std.BlankClip(clip, width=box_size, height=box_size, color={foreground})

def move_box(n):
    left = (n * {speed_x}) % (clip.width - box_size)
    top = (n * {speed_y}) % (clip.height - box_size)
    placed = core.std.AddBorders(box, left=left, top=top, right=clip.width - box_size - left, bottom=clip.height - box_size - top, color={background})
    return placed

clip = core.std.FrameEval(base, move_box)
"#
                )
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub mode: Option<i64>,
    pub blksize: Option<i64>,
    pub maxshift: Option<i64>,
    pub shiftrange: Option<i64>,
    pub length: Option<i64>,
    pub strict: Option<i64>,
}

impl FilterParams {
    pub fn to_kwargs(&self) -> String {
        let mut kwargs = Vec::new();
        let args = [
            ("mode", self.mode),
            ("blksize", self.blksize),
            ("maxshift", self.maxshift),
            ("shiftrange", self.shiftrange),
            ("length", self.length),
            ("strict", self.strict),
        ];
        for (name, value) in args {
            if let Some(value) = value {
                kwargs.push(format!("{name}={value}"));
            }
        }
        kwargs.join(", ")
    }
}

/// Loads the plugin from `DATAMOSH_PLUGIN_PATH` when it is set
pub fn load_plugin_line() -> String {
    std::env::var("DATAMOSH_PLUGIN_PATH")
        .map(|path| format!("core.std.LoadPlugin(path=r\"{path}\")"))
        .unwrap_or_default()
}

/// Output 0 is the source clip, output 1 is the datamoshed clip
pub fn generate_script(clip_config: &TestClipConfig, params: &FilterParams) -> String {
    let mut script = format!(
        r#"
import vapoursynth as vs
core = vs.core
{}

# Generate base clip
clip = core.std.BlankClip(width={}, height={}, format={}, length={})
{}
clip.set_output(0)
"#,
        load_plugin_line(),
        clip_config.width,
        clip_config.height,
        clip_config.format,
        clip_config.length,
        clip_config.content_type.to_script(clip_config.colors),
    );

    let kwargs = params.to_kwargs();
    writeln!(
        &mut script,
        "core.mosh.Datamosh(clip{}).set_output(1)",
        if kwargs.is_empty() {
            String::new()
        } else {
            format!(", {kwargs}")
        }
    )
    .unwrap();

    script
}
