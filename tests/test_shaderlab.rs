use std::fs;

use pretty_assertions::assert_eq;
use turnip_dx2cg::{
    dx9_text::DX9Error,
    process_file,
    shaderlab::{indent, locate_program},
    splice, DX9ErrorKind, TranspileConfig,
};

const PREFIX: &str = "Shader \"Test\" {
SubShader {
 Pass {
";

const SUFFIX: &str = " }
}
}
";

const PROGRAMS: &str = "Program \"vp\" {
SubProgram \"opengl \" {
\"!!ARBvp1.0
END
\"
}
SubProgram \"d3d9 \" {
Bind \"vertex\" Vertex
Matrix 0 [glstate_matrix_mvp]
\"vs_1_1
dcl_position v0
dp4 oPos.x, v0, c0
\"
}
}
Program \"fp\" {
SubProgram \"d3d9 \" {
Vector 0 [_Color]
\"ps_2_0
mov oC0, c0
\"
}
}
#LINE 12
";

const EXPECTED_BLOCK: &str = "BindChannels {
\tBind \"vertex\" Vertex
}
CGPROGRAM
#include \"UnityCG.cginc\"
#pragma exclude_renderers xbox360 ps3 gles
#pragma vertex vert
#pragma fragment frag

struct appdata {
\tfloat4 vertex : POSITION;
\tfloat3 normal : NORMAL;
\tfloat4 texcoord : TEXCOORD0;
\tfloat4 texcoord1 : TEXCOORD1;
\tfloat4 tangent : TANGENT;
\tfloat4 color : COLOR;
};

struct v2f {
\tfloat4 pos : SV_POSITION;
\tfloat4 t0 : TEXCOORD0;
\tfloat4 t1 : TEXCOORD1;
\tfloat4 t2 : TEXCOORD2;
\tfloat4 t3 : TEXCOORD3;
\tfloat fog : FOG;
\tfloat4 d0 : COLOR0;
\tfloat4 d1 : COLOR1;
};

struct f2a {
\tfloat4 c0 : COLOR0;
\tfloat4 c1 : COLOR1;
\tfloat depth : DEPTH;
};

float4 _Color;

v2f vert(appdata vardat) {
\tfloat4 r0, r1, r2, r3, r4;
\tfloat4 tmp;
\tv2f o;

\t// dcl_position v0
\tfloat4 v0 = vardat.vertex;
\t// dp4 oPos.x, v0, c0
\ttmp = dot((float4)v0, (float4)UNITY_MATRIX_MVP[0]);
\to.pos.x = tmp.x;

\treturn o;
}

f2a frag(v2f i) {
\tfloat4 r0, r1, r2, r3, r4;
\tfloat4 tmp;
\tf2a o;

\t// mov oC0, c0
\ttmp = _Color;
\to.c0.x = tmp.x;
\to.c0.y = tmp.y;
\to.c0.z = tmp.z;
\to.c0.w = tmp.w;

\treturn o;
}

ENDCG";

fn container(programs: &str) -> String {
    format!("{}{}{}", PREFIX, programs, SUFFIX)
}

#[test]
fn test_shaderlab_splice_both_stages() {
    let text = container(PROGRAMS);
    let spliced = splice(&text, &TranspileConfig::default()).unwrap();

    assert!(spliced.changed);
    assert_eq!(
        spliced.text,
        format!("{}{}{}", PREFIX, indent(EXPECTED_BLOCK, 3), SUFFIX)
    );
}

#[test]
fn test_shaderlab_indent_depth() {
    let text = container(PROGRAMS);
    let config = TranspileConfig {
        indent_depth: 1,
        ..TranspileConfig::default()
    };
    let spliced = splice(&text, &config).unwrap();
    assert!(spliced.text.contains("\n\tCGPROGRAM\n"));
    assert!(spliced.text.contains("\n\t\tfloat4 tmp;\n"));
    assert!(spliced.text.contains("\n\tENDCG\n }\n"));
}

#[test]
fn test_shaderlab_legacy_position() {
    let text = container(PROGRAMS);
    let config = TranspileConfig {
        legacy: true,
        ..TranspileConfig::default()
    };
    let spliced = splice(&text, &config).unwrap();
    assert!(spliced.text.contains("float4 pos : POSITION;"));
    assert!(spliced.text.contains("(float4)glstate.matrix.mvp[0]"));
    assert!(!spliced.text.contains("SV_POSITION"));
}

#[test]
fn test_shaderlab_vertex_only_program() {
    let text = container(
        "Program \"vp\" {
SubProgram \"d3d9 \" {
Keywords { \"POINT\" \"SPOT\" }
Vector 4 [glstate_lightmodel_ambient]
\"vs_2_0
mov r6, c4
mov oD0, r6
\"
}
}
#LINE 40
",
    );
    let spliced = splice(&text, &TranspileConfig::default()).unwrap();

    assert!(spliced.text.contains("\t\t\tLighting On\n\t\t\tCGPROGRAM\n"));
    assert!(spliced.text.contains("#pragma multi_compile POINT SPOT\n"));
    assert!(spliced.text.contains("#pragma vertex vert\n"));
    assert!(!spliced.text.contains("#pragma fragment"));
    assert!(!spliced.text.contains("struct f2a"));
    assert!(spliced.text.contains("struct v2f"));
    assert!(spliced.text.contains("float4 r0, r1, r2, r3, r4, r5, r6;"));
    assert!(spliced.text.contains("tmp = glstate.lightmodel.ambient;"));
}

#[test]
fn test_shaderlab_no_d3d9_is_untouched() {
    let text = container(
        "Program \"vp\" {
SubProgram \"opengl \" {
\"!!ARBvp1.0
END
\"
}
}
#LINE 7
",
    );
    let spliced = splice(&text, &TranspileConfig::default()).unwrap();
    assert!(!spliced.changed);
    assert_eq!(spliced.text, text);

    let plain = "Shader \"Plain\" { SubShader { Pass { Color (1,1,1,1) } } }\n";
    let spliced = splice(plain, &TranspileConfig::default()).unwrap();
    assert!(!spliced.changed);
    assert_eq!(spliced.text, plain);
}

#[test]
fn test_shaderlab_sections_are_independent() {
    let second = PROGRAMS.replace("#LINE 12", "#LINE 30");
    let text = format!("{}{}between\n{}{}", PREFIX, PROGRAMS, second, SUFFIX);
    let spliced = splice(&text, &TranspileConfig::default()).unwrap();

    let block = indent(EXPECTED_BLOCK, 3);
    assert_eq!(
        spliced.text,
        format!("{}{}between\n{}{}", PREFIX, block, block, SUFFIX)
    );
}

#[test]
fn test_shaderlab_locate() {
    let text = container(PROGRAMS);
    let section = locate_program(&text, 0).unwrap().unwrap();

    assert_eq!(&text[section.span.clone()], PROGRAMS);
    assert_eq!(section.programs.len(), 2);
    let families: Vec<&str> = section.subprograms().map(|s| s.family).collect();
    assert_eq!(families, vec!["opengl", "d3d9", "d3d9"]);
    assert!(section.has_d3d9());

    assert_eq!(locate_program(&text, section.span.end).unwrap(), None);
}

#[test]
fn test_shaderlab_malformed() {
    let config = TranspileConfig::default();

    let no_line = container("Program \"vp\" {\nSubProgram \"d3d9 \" {\n\"vs_1_1\n\"\n}\n}\n");
    let err = splice(&no_line, &config).unwrap_err();
    assert_eq!(err.kind(), DX9ErrorKind::MalformedContainer);
    assert!(matches!(err.err, DX9Error::NoLineMarker(_)));

    let unclosed = container("Program \"vp\" {\nSubProgram \"d3d9 \" {\n\"vs_1_1\n\"\n#LINE 3\n");
    let err = splice(&unclosed, &config).unwrap_err();
    assert_eq!(err.kind(), DX9ErrorKind::MalformedContainer);
    assert!(matches!(err.err, DX9Error::NoClosingBracket(_)));
}

#[test]
fn test_shaderlab_multi_compile_combos() {
    let text = container(
        "Program \"vp\" {
// Vertex combos: 2
SubProgram \"d3d9 \" {
Keywords { \"SHADOWS_OFF\" }
Bind \"vertex\" Vertex
Matrix 0 [glstate_matrix_mvp]
\"vs_1_1
dp4 oPos.x, v0, c0
\"
}
SubProgram \"d3d9 \" {
Keywords { \"SHADOWS_ON\" }
Bind \"vertex\" Vertex
Bind \"normal\" Normal
Matrix 0 [glstate_matrix_mvp]
Vector 4 [_ShadowOffset]
\"vs_1_1
dp4 oPos.y, v0, c4
\"
}
}
#LINE 3
",
    );
    let spliced = splice(&text, &TranspileConfig::default()).unwrap();

    assert!(spliced.changed);
    assert_eq!(spliced.text.matches("v2f vert(appdata vardat) {").count(), 1);
    assert!(spliced.text.contains("// dp4 oPos.x, v0, c0\n"));
    assert!(!spliced.text.contains("dp4 oPos.y"));
    assert!(spliced.text.contains("#pragma multi_compile SHADOWS_OFF SHADOWS_ON\n"));
    assert!(spliced.text.contains("\tBind \"vertex\" Vertex\n\t\t\t\tBind \"normal\" Normal\n"));
    assert!(spliced.text.contains("\t\t\tfloat4 _ShadowOffset;\n"));
}

#[test]
fn test_shaderlab_unknown_glstate() {
    let text = container(&PROGRAMS.replace("glstate_matrix_mvp", "glstate_nonexistent_thing"));
    let err = splice(&text, &TranspileConfig::default()).unwrap_err();
    assert_eq!(err.kind(), DX9ErrorKind::UnrecognizedGlobalState);
    assert_eq!(err.line, "Matrix 0 [glstate_nonexistent_thing]");
}

#[test]
fn test_shaderlab_process_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = TranspileConfig::default();

    let input = dir.path().join("Diffuse.shader");
    let output = dir.path().join("Diffuse_hlsl.shader");
    fs::write(&input, container(PROGRAMS)).unwrap();
    assert!(process_file(&input, &output, &config).unwrap());
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        format!("{}{}{}", PREFIX, indent(EXPECTED_BLOCK, 3), SUFFIX)
    );
    assert_eq!(fs::read_to_string(&input).unwrap(), container(PROGRAMS));

    // Already converted output has nothing left to translate
    let again = dir.path().join("Diffuse_hlsl_hlsl.shader");
    assert!(!process_file(&output, &again, &config).unwrap());
    assert!(!again.exists());

    // Failures leave nothing behind either
    let broken = dir.path().join("Broken.shader");
    let broken_out = dir.path().join("Broken_hlsl.shader");
    fs::write(
        &broken,
        container(&PROGRAMS.replace("glstate_matrix_mvp", "glstate_nonexistent_thing")),
    )
    .unwrap();
    assert!(process_file(&broken, &broken_out, &config).is_err());
    assert!(!broken_out.exists());
}
