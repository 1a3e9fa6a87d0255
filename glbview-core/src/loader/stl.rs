/// STL decoding for binary and ASCII files
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::preceded,
    IResult,
};

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Decode a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> ViewerResult<Mesh> {
    if data.len() < HEADER_LEN + 4 {
        return Err(ViewerError::Stl("file too small to be a valid STL".to_string()));
    }

    let declared = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let needed = declared
        .checked_mul(FACET_LEN)
        .and_then(|n| n.checked_add(HEADER_LEN + 4));
    if needed.map_or(true, |n| data.len() < n) {
        return Err(ViewerError::Stl(format!(
            "unexpected end of file: header declares {} facets",
            declared
        )));
    }

    match binary_stl(data) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(ViewerError::Stl(format!("malformed binary STL: {:?}", e))),
    }
}

fn binary_stl(input: &[u8]) -> IResult<&[u8], Mesh> {
    let (input, _) = take(HEADER_LEN)(input)?;
    let (input, facet_count) = le_u32(input)?;
    let (input, triangles) = count(binary_facet, facet_count as usize)(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    mesh.triangles = triangles;
    Ok((input, mesh))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = le_vec3(input)?;
    let (input, a) = le_vec3(input)?;
    let (input, b) = le_vec3(input)?;
    let (input, c) = le_vec3(input)?;
    let (input, _attributes) = le_u16(input)?;
    Ok((input, facet(normal, [a, b, c])))
}

fn le_vec3(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, x) = le_f32(input)?;
    let (input, y) = le_f32(input)?;
    let (input, z) = le_f32(input)?;
    Ok((input, [x, y, z]))
}

/// Decode an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> ViewerResult<Mesh> {
    match ascii_stl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(ViewerError::Stl(format!("malformed ASCII STL: {:?}", e))),
    }
}

fn ascii_stl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    mesh.triangles = triangles;
    Ok((input, mesh))
}

fn ascii_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vec3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, facet(normal, [a, b, c])))
}

fn ascii_vertex(input: &str) -> IResult<&str, [f32; 3]> {
    preceded(preceded(multispace0, tag("vertex")), ascii_vec3)(input)
}

fn ascii_vec3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, [x, y, z]))
}

/// Build a triangle, recomputing the normal when the file leaves it zeroed
fn facet(normal: [f32; 3], corners: [[f32; 3]; 3]) -> Triangle {
    let [a, b, c] = corners.map(|[x, y, z]| Point3::new(x, y, z));
    let stored = Vector3::from(normal);
    let mut triangle = Triangle::new(
        Vertex::new(a, stored),
        Vertex::new(b, stored),
        Vertex::new(c, stored),
    );
    if stored.norm_squared() < 1e-12 {
        let computed = triangle.face_normal();
        for vertex in &mut triangle.vertices {
            vertex.normal = computed;
        }
    }
    triangle
}

/// Decode STL, trying ASCII first when the file opens with `solid`.
///
/// Binary files are allowed to start their header with `solid` too, so a
/// failed ASCII parse falls through to the binary decoder.
pub fn parse_stl(data: &[u8]) -> ViewerResult<Mesh> {
    if data.starts_with(b"solid") {
        if let Ok(mesh) = std::str::from_utf8(data)
            .map_err(|e| ViewerError::Stl(e.to_string()))
            .and_then(parse_ascii_stl)
        {
            return Ok(mesh);
        }
    }

    parse_binary_stl(data)
}
