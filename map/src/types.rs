pub type Coord = f64;
pub type LightLevel = i16;
pub type LinedefFlags = u16;
pub type LinedefId = u32;
pub type MaterialId = u16;
pub type SectorId = u32;
pub type SectorTag = u16;
pub type SectorType = u16;
pub type SidedefId = i32;
pub type SpecialType = u16;
pub type VertexId = u32;

/// Sentinel for a missing sidedef reference on one side of a linedef.
pub const NO_SIDEDEF: SidedefId = -1;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub x: Coord,
    pub y: Coord,
}

#[derive(Copy, Clone, Debug)]
pub struct Linedef {
    pub start_vertex: VertexId,
    pub end_vertex: VertexId,
    pub flags: LinedefFlags,
    pub special_type: SpecialType,
    pub sector_tag: SectorTag,
    pub right_side: SidedefId,
    pub left_side: SidedefId,
    /// Set by the loader for lines claimed by a polyobject; these are kept
    /// out of the static partition entirely.
    pub polyobj: bool,
}

impl Linedef {
    pub fn impassable(&self) -> bool {
        self.flags & 0x0001 != 0
    }

    pub fn is_two_sided(&self) -> bool {
        self.flags & 0x0004 != 0
    }

    pub fn blocks_sound(&self) -> bool {
        self.flags & 0x0040 != 0
    }

    /// Whether a back sidedef is actually present; the partitioner cares
    /// about this, not about the cosmetic two-sided flag.
    pub fn has_back_side(&self) -> bool {
        self.left_side != NO_SIDEDEF
    }

    pub fn has_front_side(&self) -> bool {
        self.right_side != NO_SIDEDEF
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Sidedef {
    pub x_offset: Coord,
    pub y_offset: Coord,
    pub upper_material: MaterialId,
    pub lower_material: MaterialId,
    pub middle_material: MaterialId,
    pub sector: SectorId,
}

#[derive(Copy, Clone, Debug)]
pub struct Sector {
    pub floor_height: Coord,
    pub ceiling_height: Coord,
    pub floor_material: MaterialId,
    pub ceiling_material: MaterialId,
    pub light: LightLevel,
    pub sector_type: SectorType,
    pub tag: SectorTag,
}
