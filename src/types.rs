/// Annotation export formats accepted by the server's dump endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AnnotationFormat {
    #[value(name = "cvat-images-1-1")]
    CvatImages1_1,
    #[value(name = "cvat-video-1-1")]
    CvatVideo1_1,
    #[value(name = "coco-1-0")]
    Coco1_0,
    #[value(name = "pascal-voc-1-1")]
    PascalVoc1_1,
}

impl AnnotationFormat {
    /// The display name the server expects in the `format` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationFormat::CvatImages1_1 => "CVAT for images 1.1",
            AnnotationFormat::CvatVideo1_1 => "CVAT for video 1.1",
            AnnotationFormat::Coco1_0 => "COCO 1.0",
            AnnotationFormat::PascalVoc1_1 => "PASCAL VOC 1.1",
        }
    }
}
