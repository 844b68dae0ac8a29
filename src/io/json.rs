//! JSON persistence through serde_json.

use std::io::{Read, Write};

use crate::debug_invariants::DebugInvariants;
use crate::geomodel::GeoModel;
use crate::io::{GeoModelReader, GeoModelWriter};
use crate::model_error::GeoModelError;

/// Reads and writes geomodels as JSON documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonGeoModelIo {
    /// Indent the output.
    pub pretty: bool,
}

impl JsonGeoModelIo {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl GeoModelWriter for JsonGeoModelIo {
    fn write<W: Write>(&self, writer: W, model: &GeoModel) -> Result<(), GeoModelError> {
        if !model.is_finalized() {
            return Err(GeoModelError::NotFinalized);
        }
        if self.pretty {
            serde_json::to_writer_pretty(writer, model)?;
        } else {
            serde_json::to_writer(writer, model)?;
        }
        Ok(())
    }
}

impl GeoModelReader for JsonGeoModelIo {
    fn read<R: Read>(&self, reader: R) -> Result<GeoModel, GeoModelError> {
        let mut model: GeoModel = serde_json::from_reader(reader)?;
        if !model.is_finalized() {
            return Err(GeoModelError::NotFinalized);
        }
        model.rebuild_indices();
        model.validate_invariants()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GeoModelBuilder;
    use crate::topology::entity::{MeshEntityId, MeshEntityType};

    fn finalized_corners() -> GeoModel {
        let mut model = GeoModel::new();
        let mut b = GeoModelBuilder::new(&mut model);
        b.create_mesh_entities(MeshEntityType::Corner, 2).unwrap();
        b.set_corner(0, [0.0, 0.0, 0.0]).unwrap();
        b.set_corner(1, [0.25, -1.5, 3.0]).unwrap();
        b.end_geomodel().unwrap();
        model
    }

    #[test]
    fn building_model_is_not_written() {
        let model = GeoModel::new();
        let mut buf = Vec::new();
        assert_eq!(
            JsonGeoModelIo::default().write(&mut buf, &model),
            Err(GeoModelError::NotFinalized)
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn loaded_model_answers_vertex_queries() {
        let model = finalized_corners();
        let mut buf = Vec::new();
        JsonGeoModelIo::pretty().write(&mut buf, &model).unwrap();
        let loaded = JsonGeoModelIo::default().read(buf.as_slice()).unwrap();
        assert!(loaded.is_finalized());
        assert_eq!(loaded.vertices(), model.vertices());
        assert_eq!(loaded.vertex_pool().find(&[0.25, -1.5, 3.0]), Some(1));
        assert_eq!(
            loaded.entities_at_vertex(1, MeshEntityType::Corner),
            vec![MeshEntityId::corner(1)]
        );
    }

    #[test]
    fn garbage_is_a_persistence_error() {
        let err = JsonGeoModelIo::default().read(&b"{ not json"[..]).unwrap_err();
        assert!(matches!(err, GeoModelError::Serialization(_)));
    }
}
