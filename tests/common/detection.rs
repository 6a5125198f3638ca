use anyhow::{Context, Result};
use vapoursynth::prelude::Environment;

use super::script_gen::load_plugin_line;

/// Checks that the `mosh` namespace can be used from a script
pub fn check_datamosh_available() -> Result<()> {
    let test_script = format!(
        r#"
import vapoursynth as vs
core = vs.core
{}
clip = core.std.BlankClip(width=64, height=64, format=vs.GRAY8, length=2)
try:
    mosh = core.mosh.Datamosh(clip)
    mosh.set_output()
except AttributeError as e:
    raise Exception(f"Datamosh plugin (mosh namespace) not available: {{e}}")
"#,
        load_plugin_line()
    );

    Environment::from_script(&test_script).context(
        "Datamosh plugin not detected. Either copy the built library into the VapourSynth \
         plugin directory, or point DATAMOSH_PLUGIN_PATH at it, e.g.\n\
         DATAMOSH_PLUGIN_PATH=target/debug/libvapoursynth_datamosh.so",
    )?;

    Ok(())
}
