pub mod iou_device;
