//! Fixed text wrapped around the generated code.

use crate::dx9_text::ShaderStage;

pub const CG_HEADER: &str = "CGPROGRAM
#include \"UnityCG.cginc\"
#pragma exclude_renderers xbox360 ps3 gles
";

pub const CG_FOOTER: &str = "ENDCG";

pub const STRUCT_APPDATA: &str = "struct appdata {
\tfloat4 vertex : POSITION;
\tfloat3 normal : NORMAL;
\tfloat4 texcoord : TEXCOORD0;
\tfloat4 texcoord1 : TEXCOORD1;
\tfloat4 tangent : TANGENT;
\tfloat4 color : COLOR;
};
";

pub fn struct_v2f(legacy: bool) -> String {
    let postype = if legacy { "POSITION" } else { "SV_POSITION" };
    format!(
        "struct v2f {{
\tfloat4 pos : {};
\tfloat4 t0 : TEXCOORD0;
\tfloat4 t1 : TEXCOORD1;
\tfloat4 t2 : TEXCOORD2;
\tfloat4 t3 : TEXCOORD3;
\tfloat fog : FOG;
\tfloat4 d0 : COLOR0;
\tfloat4 d1 : COLOR1;
}};
",
        postype
    )
}

pub const STRUCT_F2A: &str = "struct f2a {
\tfloat4 c0 : COLOR0;
\tfloat4 c1 : COLOR1;
\tfloat depth : DEPTH;
};
";

/// Lowest temporary count declared in every function, whether used or not
pub const MIN_TEMPS: u32 = 4;

/// `(pragma, signature, output struct)` for a stage's entry point
pub fn entry_point(stage: ShaderStage) -> (&'static str, &'static str, &'static str) {
    match stage {
        ShaderStage::Vertex => ("#pragma vertex vert", "v2f vert(appdata vardat) {", "v2f"),
        ShaderStage::Fragment => ("#pragma fragment frag", "f2a frag(v2f i) {", "f2a"),
    }
}
